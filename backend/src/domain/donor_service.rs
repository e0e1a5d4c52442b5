//! Donor directory: registration, profile maintenance, and the match
//! queries used by the alert dispatcher.

use std::sync::Arc;

use shared::{
    now_rfc3339, BloodType, CreateDonorRequest, Donor, DonorFilters, DonorStats, MatchQuery,
    UpdateDonorRequest,
};
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::donor::{self, NewDonor};
use crate::storage::DonorStorage;

#[derive(Clone)]
pub struct DonorService {
    donors: Arc<dyn DonorStorage>,
}

impl DonorService {
    pub fn new(donors: Arc<dyn DonorStorage>) -> Self {
        Self { donors }
    }

    pub async fn create(&self, payload: CreateDonorRequest) -> DomainResult<Donor> {
        let new_donor = NewDonor::from_payload(payload, &now_rfc3339())?;
        let id = self.donors.insert_donor(&new_donor).await?;
        info!("registered donor {} ({})", id, new_donor.blood_type);

        self.donors
            .get_donor(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Donor not found after insert"))
    }

    pub async fn get_by_id(&self, id: i64) -> DomainResult<Option<Donor>> {
        Ok(self.donors.get_donor(id).await?)
    }

    pub async fn get_by_user_id(&self, user_id: i64) -> DomainResult<Option<Donor>> {
        Ok(self.donors.get_donor_by_user(user_id).await?)
    }

    /// All donors under optional filters, most recently registered first.
    pub async fn get_all(&self, filters: DonorFilters) -> DomainResult<Vec<Donor>> {
        Ok(self.donors.list_donors(&filters).await?)
    }

    /// Available donors of exactly the requested type. No ABO/Rh
    /// compatibility expansion is applied; O- is matched only by O-
    /// requests.
    pub async fn get_by_blood_type(&self, blood_type: BloodType) -> DomainResult<Vec<Donor>> {
        Ok(self.donors.list_available_by_type(blood_type).await?)
    }

    /// Donors eligible for a request: exact blood type and available, the
    /// non-negotiable floor. When the query carries coordinates the result
    /// is proximity-ranked, nearest first, with donors of unknown location
    /// last; without coordinates the result is unranked.
    pub async fn find_matches(&self, query: &MatchQuery) -> DomainResult<Vec<Donor>> {
        let mut matches = self.donors.list_available_by_type(query.blood_type).await?;

        if let (Some(lat), Some(lon)) = (query.latitude, query.longitude) {
            matches.sort_by(|a, b| {
                let da = distance_from(a, lat, lon);
                let db = distance_from(b, lat, lon);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        Ok(matches)
    }

    pub async fn update(&self, id: i64, patch: UpdateDonorRequest) -> DomainResult<Donor> {
        let mut record = self
            .donors
            .get_donor(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Donor {} not found", id)))?;

        donor::apply_update(&mut record, &patch)?;
        self.donors.update_donor(&record).await?;
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> DomainResult<()> {
        if !self.donors.delete_donor(id).await? {
            return Err(DomainError::not_found(format!("Donor {} not found", id)));
        }
        Ok(())
    }

    pub async fn get_stats(&self) -> DomainResult<DonorStats> {
        Ok(self.donors.donor_stats().await?)
    }
}

/// Haversine distance in kilometers from a donor to the request location.
/// Donors without stored coordinates sort behind every located donor.
fn distance_from(donor: &Donor, lat: f64, lon: f64) -> f64 {
    match (donor.latitude, donor.longitude) {
        (Some(d_lat), Some(d_lon)) => haversine_km(lat, lon, d_lat, d_lon),
        _ => f64::INFINITY,
    }
}

fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::{DbConnection, DonorRepository};

    async fn service() -> DonorService {
        let db = DbConnection::init_test().await.unwrap();
        DonorService::new(Arc::new(DonorRepository::new(db)))
    }

    fn donor_payload(name: &str, blood_type: &str, city: &str) -> CreateDonorRequest {
        CreateDonorRequest {
            name: name.to_string(),
            blood_type: Some(blood_type.to_string()),
            phone: "+91 98765 43210".to_string(),
            city: city.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_defaults_to_available() {
        let service = service().await;
        let donor = service
            .create(donor_payload("Rahul Sharma", "O+", "Mumbai"))
            .await
            .unwrap();

        assert!(donor.available);
        assert_eq!(donor.blood_type, BloodType::OPositive);
    }

    #[tokio::test]
    async fn create_rejects_missing_blood_type() {
        let service = service().await;
        let err = service
            .create(CreateDonorRequest {
                name: "No Type".to_string(),
                phone: "123".to_string(),
                city: "Delhi".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn filters_are_conjunctive() {
        let service = service().await;
        service
            .create(donor_payload("Priya Patel", "A+", "Delhi"))
            .await
            .unwrap();
        service
            .create(donor_payload("Amit Kumar", "A+", "Bangalore"))
            .await
            .unwrap();
        let mut unavailable = donor_payload("Sneha Reddy", "A+", "Delhi");
        unavailable.available = Some(false);
        service.create(unavailable).await.unwrap();

        let matches = service
            .get_all(DonorFilters {
                blood_type: Some(BloodType::APositive),
                city: Some("Del".to_string()),
                available: Some(true),
            })
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Priya Patel");
    }

    #[tokio::test]
    async fn blood_type_lookup_is_exact_and_available_only() {
        let service = service().await;
        service
            .create(donor_payload("Vikram Singh", "O-", "Chennai"))
            .await
            .unwrap();
        service
            .create(donor_payload("Meera Nair", "O+", "Chennai"))
            .await
            .unwrap();
        let mut off_duty = donor_payload("Rajesh Verma", "O-", "Chennai");
        off_duty.available = Some(false);
        service.create(off_duty).await.unwrap();

        // O- universal-donor compatibility is deliberately not applied.
        let matches = service.get_by_blood_type(BloodType::ONegative).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Vikram Singh");
    }

    #[tokio::test]
    async fn matches_rank_by_proximity_when_coordinates_present() {
        let service = service().await;

        let mut near = donor_payload("Near Donor", "B+", "Pune");
        near.latitude = Some(18.52);
        near.longitude = Some(73.86);
        service.create(near).await.unwrap();

        let mut far = donor_payload("Far Donor", "B+", "Jaipur");
        far.latitude = Some(26.91);
        far.longitude = Some(75.79);
        service.create(far).await.unwrap();

        // No coordinates on record: ranked last.
        service
            .create(donor_payload("Unlocated Donor", "B+", "Pune"))
            .await
            .unwrap();

        let matches = service
            .find_matches(&MatchQuery {
                blood_type: BloodType::BPositive,
                latitude: Some(18.50),
                longitude: Some(73.85),
            })
            .await
            .unwrap();

        let names: Vec<&str> = matches.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Near Donor", "Far Donor", "Unlocated Donor"]);
    }

    #[tokio::test]
    async fn partial_update_toggles_availability_only() {
        let service = service().await;
        let donor = service
            .create(donor_payload("Anjali Gupta", "A-", "Pune"))
            .await
            .unwrap();

        let updated = service
            .update(
                donor.id,
                UpdateDonorRequest {
                    available: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!updated.available);
        assert_eq!(updated.name, donor.name);
        assert_eq!(updated.city, donor.city);
    }

    #[tokio::test]
    async fn stats_group_available_donors_by_type() {
        let service = service().await;
        service
            .create(donor_payload("D1", "O+", "Mumbai"))
            .await
            .unwrap();
        service
            .create(donor_payload("D2", "O+", "Mumbai"))
            .await
            .unwrap();
        let mut off = donor_payload("D3", "AB-", "Mumbai");
        off.available = Some(false);
        service.create(off).await.unwrap();

        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.available, 2);
        assert_eq!(stats.by_type.get(&BloodType::OPositive), Some(&2));
        assert_eq!(stats.by_type.get(&BloodType::AbNegative), None);
    }
}
