use crate::{
    config::{ScrapingEnv, SiteConfig},
    requests::RequestClient,
};

pub struct ScrapingContext {
    pub scraping_env: ScrapingEnv,
    pub site_config: SiteConfig,
    pub request_client: RequestClient,
}

impl ScrapingContext {
    pub fn new(scraping_env: ScrapingEnv) -> anyhow::Result<Self> {
        let site_config = SiteConfig::load(&scraping_env.site_config_path)?;
        let request_client = RequestClient::new()?;
        Ok(ScrapingContext {
            scraping_env,
            site_config,
            request_client,
        })
    }
}
