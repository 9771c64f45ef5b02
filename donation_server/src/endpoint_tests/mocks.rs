use cpg_common::Money;
use donation_engine::{
    db_types::{
        ActivityEntry,
        Beneficiary,
        Donation,
        DonationStatus,
        Fund,
        NewActivityEntry,
        NewBeneficiary,
        NewDonation,
        NewFund,
        NewWithdrawal,
        TransactionRef,
        UpdateBeneficiary,
        Withdrawal,
    },
    traits::{
        AuditManagement,
        BeneficiaryManagement,
        ChargeAuthorization,
        DonationLedgerDatabase,
        FinalizeDonationResult,
        FundManagement,
        GatewayBeneficiaryRecord,
        GatewayError,
        LedgerError,
        NewCharge,
        PaymentGateway,
    },
};
use mockall::mock;

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl DonationLedgerDatabase for Backend {
        fn url(&self) -> &str;
        async fn insert_donation(&self, donation: NewDonation) -> Result<(Donation, bool), LedgerError>;
        async fn finalize_donation(&self, reference: &TransactionRef, outcome: DonationStatus) -> Result<FinalizeDonationResult, LedgerError>;
        async fn fetch_donation_by_reference(&self, reference: &TransactionRef) -> Result<Option<Donation>, LedgerError>;
        async fn fetch_donation_by_id(&self, id: i64) -> Result<Option<Donation>, LedgerError>;
        async fn fetch_donations_for_fund(&self, fund_id: i64) -> Result<Vec<Donation>, LedgerError>;
        async fn create_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<(Withdrawal, Money), LedgerError>;
        async fn delete_withdrawal(&self, id: i64) -> Result<Withdrawal, LedgerError>;
        async fn fetch_withdrawals_for_fund(&self, fund_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;
        async fn fetch_withdrawals(&self) -> Result<Vec<Withdrawal>, LedgerError>;
        async fn close(&mut self) -> Result<(), LedgerError>;
    }
    impl FundManagement for Backend {
        async fn create_fund(&self, fund: NewFund) -> Result<Fund, LedgerError>;
        async fn fetch_fund(&self, id: i64) -> Result<Option<Fund>, LedgerError>;
        async fn fetch_funds(&self) -> Result<Vec<Fund>, LedgerError>;
        async fn credit_fund(&self, fund_id: i64, amount: Money) -> Result<Money, LedgerError>;
        async fn debit_fund(&self, fund_id: i64, amount: Money) -> Result<Money, LedgerError>;
    }
    impl BeneficiaryManagement for Backend {
        async fn insert_beneficiary(&self, beneficiary: NewBeneficiary) -> Result<(Beneficiary, bool), LedgerError>;
        async fn fetch_beneficiary(&self, gateway_id: &str) -> Result<Option<Beneficiary>, LedgerError>;
        async fn fetch_beneficiaries(&self) -> Result<Vec<Beneficiary>, LedgerError>;
        async fn fetch_active_beneficiary(&self) -> Result<Option<Beneficiary>, LedgerError>;
        async fn update_beneficiary(&self, gateway_id: &str, update: UpdateBeneficiary) -> Result<Beneficiary, LedgerError>;
        async fn toggle_beneficiary(&self, gateway_id: &str) -> Result<Beneficiary, LedgerError>;
        async fn delete_beneficiary(&self, gateway_id: &str) -> Result<Beneficiary, LedgerError>;
    }
    impl AuditManagement for Backend {
        async fn append_activity(&self, entry: NewActivityEntry) -> Result<(), LedgerError>;
        async fn fetch_activity_for_entity(&self, entity_type: &str, entity_id: &str) -> Result<Vec<ActivityEntry>, LedgerError>;
    }
}

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl PaymentGateway for Gateway {
        async fn create_charge(&self, charge: NewCharge) -> Result<ChargeAuthorization, GatewayError>;
        async fn register_beneficiary(&self, beneficiary: &NewBeneficiary) -> Result<String, GatewayError>;
        async fn remove_beneficiary(&self, gateway_id: &str) -> Result<(), GatewayError>;
        async fn fetch_beneficiaries(&self) -> Result<Vec<GatewayBeneficiaryRecord>, GatewayError>;
    }
}
