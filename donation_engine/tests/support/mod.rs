//! Shared scaffolding for the integration tests: a fresh migrated database per test and an in-memory stub of
//! the payment gateway.

pub mod prepare_env;

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
    Mutex,
};

use donation_engine::{
    db_types::NewBeneficiary,
    traits::{ChargeAuthorization, GatewayBeneficiaryRecord, NewCharge, PaymentGateway},
    GatewayError,
};

/// A gateway stand-in that hands out sequential charge references and keeps its beneficiary list in memory.
/// Setting `fail_next` makes the next charge creation fail, as an exhausted-retries client would.
#[derive(Clone, Default)]
pub struct StubGateway {
    charge_counter: Arc<AtomicU64>,
    fail_next: Arc<AtomicBool>,
    beneficiaries: Arc<Mutex<Vec<GatewayBeneficiaryRecord>>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_charge(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn seed_beneficiary(&self, gateway_id: &str, name: &str) {
        self.beneficiaries.lock().unwrap().push(GatewayBeneficiaryRecord {
            gateway_id: gateway_id.to_string(),
            name: name.to_string(),
            phone: "+237670000000".to_string(),
            email: None,
            provider: "mtn".to_string(),
            country: "CM".to_string(),
            status: "active".to_string(),
        });
    }
}

impl PaymentGateway for StubGateway {
    async fn create_charge(&self, _charge: NewCharge) -> Result<ChargeAuthorization, GatewayError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::RequestFailed("stub gateway: simulated outage".to_string()));
        }
        let n = self.charge_counter.fetch_add(1, Ordering::SeqCst);
        Ok(ChargeAuthorization {
            reference: format!("gw-test-{n:04}").into(),
            payment_url: format!("https://pay.test.example/c/{n:04}"),
        })
    }

    async fn register_beneficiary(&self, beneficiary: &NewBeneficiary) -> Result<String, GatewayError> {
        let mut records = self.beneficiaries.lock().unwrap();
        let gateway_id = format!("ben_{:04}", records.len() + 1);
        records.push(GatewayBeneficiaryRecord {
            gateway_id: gateway_id.clone(),
            name: beneficiary.name.clone(),
            phone: beneficiary.phone.clone(),
            email: beneficiary.email.clone(),
            provider: beneficiary.provider.clone(),
            country: beneficiary.country.clone(),
            status: "active".to_string(),
        });
        Ok(gateway_id)
    }

    async fn remove_beneficiary(&self, gateway_id: &str) -> Result<(), GatewayError> {
        let mut records = self.beneficiaries.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.gateway_id != gateway_id);
        if records.len() == before {
            return Err(GatewayError::Rejected(format!("stub gateway: no beneficiary [{gateway_id}]")));
        }
        Ok(())
    }

    async fn fetch_beneficiaries(&self) -> Result<Vec<GatewayBeneficiaryRecord>, GatewayError> {
        Ok(self.beneficiaries.lock().unwrap().clone())
    }
}
