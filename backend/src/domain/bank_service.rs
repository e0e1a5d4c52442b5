//! Blood bank profile maintenance and inventory-attached reads.

use std::sync::Arc;

use shared::{
    now_rfc3339, BankFilters, BloodBank, BloodBankWithInventory, CreateBloodBankRequest,
    UpdateBloodBankRequest,
};
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::bank::{self, NewBloodBank};
use crate::storage::{BankStorage, InventoryStorage};

#[derive(Clone)]
pub struct BankService {
    banks: Arc<dyn BankStorage>,
    inventory: Arc<dyn InventoryStorage>,
}

impl BankService {
    pub fn new(banks: Arc<dyn BankStorage>, inventory: Arc<dyn InventoryStorage>) -> Self {
        Self { banks, inventory }
    }

    /// Register a bank. The storage layer seeds a zero aggregate row for
    /// every blood type as part of the same insert.
    pub async fn create(&self, payload: CreateBloodBankRequest) -> DomainResult<BloodBank> {
        let new_bank = NewBloodBank::from_payload(payload, &now_rfc3339())?;
        let id = self.banks.insert_bank(&new_bank).await?;
        info!("registered blood bank {} ({})", id, new_bank.name);

        self.banks
            .get_bank(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Blood bank not found after insert"))
    }

    pub async fn get_by_id(&self, id: i64) -> DomainResult<Option<BloodBankWithInventory>> {
        let bank = match self.banks.get_bank(id).await? {
            Some(bank) => bank,
            None => return Ok(None),
        };
        let inventory = self.inventory.inventory_for_bank(id).await?;
        Ok(Some(BloodBankWithInventory { bank, inventory }))
    }

    pub async fn get_by_user_id(&self, user_id: i64) -> DomainResult<Option<BloodBank>> {
        Ok(self.banks.get_bank_by_user(user_id).await?)
    }

    pub async fn get_all(&self, filters: BankFilters) -> DomainResult<Vec<BloodBank>> {
        Ok(self
            .banks
            .list_banks(filters.city.as_deref(), filters.search.as_deref())
            .await?)
    }

    pub async fn get_all_with_inventory(&self) -> DomainResult<Vec<BloodBankWithInventory>> {
        let banks = self.banks.list_banks(None, None).await?;
        let mut result = Vec::with_capacity(banks.len());
        for bank in banks {
            let inventory = self.inventory.inventory_for_bank(bank.id).await?;
            result.push(BloodBankWithInventory { bank, inventory });
        }
        Ok(result)
    }

    pub async fn update(&self, id: i64, patch: UpdateBloodBankRequest) -> DomainResult<BloodBank> {
        let mut record = self
            .banks
            .get_bank(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Blood bank {} not found", id)))?;

        bank::apply_bank_update(&mut record, &patch);
        self.banks.update_bank(&record).await?;
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> DomainResult<()> {
        if !self.banks.delete_bank(id).await? {
            return Err(DomainError::not_found(format!("Blood bank {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::BloodType;

    use crate::storage::sqlite::{BankRepository, DbConnection, InventoryRepository};

    async fn service() -> BankService {
        let db = DbConnection::init_test().await.unwrap();
        BankService::new(
            Arc::new(BankRepository::new(db.clone())),
            Arc::new(InventoryRepository::new(db)),
        )
    }

    fn bank_payload(name: &str, city: &str) -> CreateBloodBankRequest {
        CreateBloodBankRequest {
            name: name.to_string(),
            address: "12 Station Road".to_string(),
            city: city.to_string(),
            phone: "+91 22 4000 1000".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn creation_seeds_zero_inventory_for_all_types() {
        let service = service().await;
        let bank = service.create(bank_payload("Red Cross", "Mumbai")).await.unwrap();

        let with_inventory = service.get_by_id(bank.id).await.unwrap().unwrap();
        assert_eq!(with_inventory.inventory.len(), BloodType::ALL.len());
        assert!(with_inventory.inventory.iter().all(|e| e.units == 0));
    }

    #[tokio::test]
    async fn listing_filters_by_city_and_search() {
        let service = service().await;
        service.create(bank_payload("Central Bank", "Mumbai")).await.unwrap();
        service.create(bank_payload("Apollo Bank", "Delhi")).await.unwrap();

        let mumbai = service
            .get_all(BankFilters {
                city: Some("Mum".to_string()),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(mumbai.len(), 1);
        assert_eq!(mumbai[0].name, "Central Bank");

        let searched = service
            .get_all(BankFilters {
                city: None,
                search: Some("Apollo".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].name, "Apollo Bank");
    }

    #[tokio::test]
    async fn update_on_missing_bank_is_not_found() {
        let service = service().await;
        let err = service
            .update(999, UpdateBloodBankRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
