use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sts::Client;

use crate::error::{Error, Result};

use super::AccountResolver;

#[derive(Debug, Clone)]
pub struct StsIdentity {
    client: Client,
}

impl StsIdentity {
    pub fn new(config: &SdkConfig) -> Self {
        StsIdentity {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl AccountResolver for StsIdentity {
    async fn account_id(&self) -> Result<String> {
        let response = self.client.get_caller_identity().send().await?;
        let account = response.account().ok_or(Error::MissingAccountId)?;
        Ok(account.to_owned())
    }
}
