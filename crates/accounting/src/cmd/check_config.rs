use anyhow::Result;

use crate::config::{load_cluster_config, CheckConfigArgs};

pub async fn run_check_config(args: CheckConfigArgs) -> Result<()> {
    utils::logging::init();

    let config = load_cluster_config(&args.config)
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;

    print!("{}", serde_yaml::to_string(&config.to_raw())?);
    Ok(())
}
