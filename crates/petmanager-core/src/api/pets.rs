use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::http::UploadProgress;
use crate::models::{Page, Pet, PetInput, Photo};

use super::{ApiClient, ListQuery, PhotoUpload};

const PETS_PATH: &str = "/v1/pets";

/// Pet CRUD and photo upload.
#[derive(Clone)]
pub struct PetsApi {
    client: ApiClient,
}

impl PetsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn pet_path(id: i64) -> String {
        format!("{}/{}", PETS_PATH, id)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Page<Pet>, ApiError> {
        let page: Page<Pet> = self.client.get(PETS_PATH, &query.to_params()).await?;
        debug!(count = page.content.len(), total = page.total, "Fetched pets");
        Ok(page)
    }

    pub async fn get(&self, id: i64) -> Result<Pet, ApiError> {
        self.client.get(&Self::pet_path(id), &[]).await
    }

    pub async fn create(&self, pet: &PetInput) -> Result<Pet, ApiError> {
        pet.validate()?;
        let created: Pet = self.client.post(PETS_PATH, pet).await?;
        info!(id = created.id, "Pet created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, pet: &PetInput) -> Result<Pet, ApiError> {
        pet.validate()?;
        self.client.put(&Self::pet_path(id), pet).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&Self::pet_path(id)).await?;
        info!(id, "Pet deleted");
        Ok(())
    }

    /// Create a pet and then upload its photo.
    ///
    /// The outer error means the pet was not created. Once it exists a
    /// failed upload does not undo it; the upload result is returned
    /// alongside the new pet.
    pub async fn create_with_photo(
        &self,
        pet: &PetInput,
        photo: PhotoUpload,
        progress: Option<UnboundedSender<UploadProgress>>,
    ) -> Result<(Pet, Result<Photo, ApiError>), ApiError> {
        let created = self.create(pet).await?;
        let uploaded = self.upload_photo(created.id, photo, progress).await;
        if let Err(ref e) = uploaded {
            warn!(id = created.id, error = %e, "Pet created but photo upload failed");
        }
        Ok((created, uploaded))
    }

    /// Upload a photo for the pet. Progress events are sent on `progress`
    /// while the body streams out.
    pub async fn upload_photo(
        &self,
        id: i64,
        photo: PhotoUpload,
        progress: Option<UnboundedSender<UploadProgress>>,
    ) -> Result<Photo, ApiError> {
        let path = format!("{}/fotos", Self::pet_path(id));
        self.client.upload(&path, photo, progress).await
    }
}
