use autograf_config::load_config;
use autograf_config::shared::ProvisionerConfig;

/// Loads the [`ProvisionerConfig`] and validates it.
pub fn load_provisioner_config() -> anyhow::Result<ProvisionerConfig> {
    let config = load_config::<ProvisionerConfig>()?;
    config.validate()?;

    Ok(config)
}
