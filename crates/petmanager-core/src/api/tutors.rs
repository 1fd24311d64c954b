use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::http::UploadProgress;
use crate::models::{Page, Pet, Photo, Tutor, TutorInput};

use super::{ApiClient, ListQuery, PhotoUpload};

const TUTORS_PATH: &str = "/v1/tutores";

/// Tutor CRUD, photo upload and pet links.
#[derive(Clone)]
pub struct TutorsApi {
    client: ApiClient,
}

impl TutorsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn tutor_path(id: i64) -> String {
        format!("{}/{}", TUTORS_PATH, id)
    }

    fn link_path(tutor_id: i64, pet_id: i64) -> String {
        format!("{}/pets/{}", Self::tutor_path(tutor_id), pet_id)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<Tutor>, ApiError> {
        let page: Page<Tutor> = self.client.get(TUTORS_PATH, &query.to_params()).await?;
        debug!(count = page.content.len(), total = page.total, "Fetched tutors");
        Ok(page)
    }

    pub async fn get(&self, id: i64) -> Result<Tutor, ApiError> {
        self.client.get(&Self::tutor_path(id), &[]).await
    }

    pub async fn create(&self, tutor: &TutorInput) -> Result<Tutor, ApiError> {
        tutor.validate()?;
        let created: Tutor = self.client.post(TUTORS_PATH, tutor).await?;
        info!(id = created.id, "Tutor created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, tutor: &TutorInput) -> Result<Tutor, ApiError> {
        tutor.validate()?;
        self.client.put(&Self::tutor_path(id), tutor).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&Self::tutor_path(id)).await?;
        info!(id, "Tutor deleted");
        Ok(())
    }

    /// Pets linked to a tutor.
    pub async fn pets(&self, id: i64, query: &ListQuery) -> Result<Page<Pet>, ApiError> {
        let path = format!("{}/pets", Self::tutor_path(id));
        self.client.get(&path, &query.to_params()).await
    }

    pub async fn link_pet(&self, tutor_id: i64, pet_id: i64) -> Result<(), ApiError> {
        self.client.post_empty(&Self::link_path(tutor_id, pet_id)).await?;
        info!(tutor_id, pet_id, "Pet linked to tutor");
        Ok(())
    }

    pub async fn unlink_pet(&self, tutor_id: i64, pet_id: i64) -> Result<(), ApiError> {
        self.client.delete(&Self::link_path(tutor_id, pet_id)).await?;
        info!(tutor_id, pet_id, "Pet unlinked from tutor");
        Ok(())
    }

    pub async fn upload_photo(
        &self,
        id: i64,
        photo: PhotoUpload,
        progress: Option<UnboundedSender<UploadProgress>>,
    ) -> Result<Photo, ApiError> {
        let path = format!("{}/fotos", Self::tutor_path(id));
        self.client.upload(&path, photo, progress).await
    }
}
