mod beneficiaries;
mod donations;
mod helpers;
mod mocks;
mod webhooks;
mod withdrawals;
