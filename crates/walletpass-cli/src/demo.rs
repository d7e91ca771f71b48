//! The demo operations, one per command.
//!
//! Each step prints its result to stdout in the same shape as the
//! walkthrough it follows; failures propagate and abort the run.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use walletpass_core::api::{BatchRequest, Upsert};
use walletpass_core::ids::{random_suffix, resource_id};
use walletpass_core::jwt::{save_url, PassSigner, SavePayload};
use walletpass_core::samples::{
    existing_object_references, minimal_offer_object, sample_offer_class, sample_offer_object,
};
use walletpass_core::{ServiceAccountKey, Session, Settings, WalletClient};

/// Shared state for one run: the key, a token session and the client.
pub struct Demo {
    settings: Settings,
    session: Session,
    client: WalletClient,
    signer: PassSigner,
}

impl Demo {
    /// Load the service-account key. No network traffic happens until a
    /// command needs an access token.
    pub fn new(settings: Settings) -> Result<Self> {
        let key = ServiceAccountKey::from_file(&settings.credentials_path)
            .context("Unable to load credentials")?;
        info!(email = %key.client_email, issuer_id = %settings.issuer_id, "Loaded service account");

        let signer = PassSigner::new(&key, settings.origins.clone())?;
        let session = Session::new(key)?;
        let client = WalletClient::new(&settings.api_base_url)?;

        Ok(Self {
            settings,
            session,
            client,
            signer,
        })
    }

    fn issuer_id(&self) -> &str {
        &self.settings.issuer_id
    }

    async fn authed_client(&mut self) -> Result<WalletClient> {
        let token = self
            .session
            .access_token()
            .await
            .context("Unable to obtain an access token")?;
        Ok(self.client.with_token(token))
    }

    /// Fetch a token up front so credential problems surface first.
    pub async fn auth(&mut self) -> Result<()> {
        self.authed_client().await?;
        Ok(())
    }

    pub async fn create_class(&mut self, class_suffix: &str) -> Result<String> {
        let client = self.authed_client().await?;
        let class = sample_offer_class(self.issuer_id(), class_suffix);

        let outcome = client
            .insert_class_if_absent(&class)
            .await
            .context("Unable to create class")?;
        match outcome {
            Upsert::Existing(existing) => {
                warn!(id = %existing.id, "Class already exists, not inserting");
                println!("Class {} already exists!", existing.id);
                Ok(existing.id)
            }
            Upsert::Inserted(saved) => {
                println!("Class insert id:\n{}", saved.id);
                Ok(saved.id)
            }
        }
    }

    pub async fn create_object(
        &mut self,
        class_suffix: &str,
        object_suffix: &str,
    ) -> Result<String> {
        let client = self.authed_client().await?;
        let object = sample_offer_object(self.issuer_id(), class_suffix, object_suffix, Utc::now());

        let outcome = client
            .insert_object_if_absent(&object)
            .await
            .context("Unable to create object")?;
        match outcome {
            Upsert::Existing(existing) => {
                warn!(id = %existing.id, "Object already exists, not inserting");
                println!("Object {} already exists!", existing.id);
                Ok(existing.id)
            }
            Upsert::Inserted(saved) => {
                println!("Object insert id:\n{}", saved.id);
                Ok(saved.id)
            }
        }
    }

    pub async fn expire_object(&mut self, object_suffix: &str) -> Result<String> {
        let client = self.authed_client().await?;
        let object_id = resource_id(self.issuer_id(), object_suffix);

        let saved = client
            .expire_object(&object_id)
            .await
            .context("Unable to patch object")?;

        println!("Object expiration id:\n{}", saved.id);
        Ok(saved.id)
    }

    /// Link that creates the class and object when the user saves the pass.
    pub fn jwt_new_objects(&self, class_suffix: &str, object_suffix: &str) -> Result<String> {
        let class = sample_offer_class(self.issuer_id(), class_suffix);
        let object = minimal_offer_object(self.issuer_id(), class_suffix, object_suffix);

        let token = self.signer.sign(SavePayload::new_offer(Some(class), object))?;
        let url = save_url(&token);

        println!("Add to Google Wallet link");
        println!("{}", url);
        Ok(url)
    }

    /// Link that adds already-issued objects of every vertical.
    pub fn jwt_existing_objects(&self) -> Result<String> {
        let payload = SavePayload::from_references(existing_object_references(self.issuer_id()));

        let token = self.signer.sign(payload)?;
        let url = save_url(&token);

        println!("Add to Google Wallet link");
        println!("{}", url);
        Ok(url)
    }

    pub async fn batch_create_objects(&mut self, class_suffix: &str, count: usize) -> Result<()> {
        let client = self.authed_client().await?;

        let objects: Vec<_> = (0..count)
            .map(|_| minimal_offer_object(self.issuer_id(), class_suffix, &random_suffix()))
            .collect();
        let batch = BatchRequest::create_objects(&objects)?;

        let response = client
            .batch(&batch)
            .await
            .context("Unable to send batch request")?;

        if !response.all_succeeded() {
            for part in response.parts.iter().filter(|p| !p.is_success()) {
                warn!(status = part.status, body = %part.raw_body, "Batch operation failed");
            }
        }

        println!("Batch insert response:\n{}", response.raw);
        Ok(())
    }
}
