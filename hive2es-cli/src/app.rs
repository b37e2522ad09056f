//! Wiring: turn parsed arguments into a finished run.

use crate::args::Args;
use crate::config::EnvConfig;
use crate::error::CliError;
use hive2es_core::{Hive2EsError, LoadError, RunConfig};
use hive2es_elastic::ElasticsearchAdmin;
use hive2es_hive::{find_es_hadoop_jar, HiveBatchRunner, HiveCli, HiveMetadataProvider};
use hive2es_loader::{CredentialRenewer, KinitRenewer, Orchestrator, RunReport, ShutdownSignal};

/// Validate the arguments and environment, then load every partition.
///
/// Ctrl-C is watched from the start so an interrupted discovery query is
/// reported as an interrupt.
pub async fn run(args: &Args) -> Result<RunReport, CliError> {
    let shutdown = ShutdownSignal::new();
    let listener = shutdown.listen_for_ctrl_c();
    let result = run_until_shutdown(args, shutdown).await;
    listener.abort();
    result
}

async fn run_until_shutdown(args: &Args, shutdown: ShutdownSignal) -> Result<RunReport, CliError> {
    let env = EnvConfig::load(args.config.as_deref())?;
    let config = RunConfig::from_options(args.to_options(&env)).map_err(Hive2EsError::from)?;
    tracing::info!(
        source = %config.qualified_source(),
        index = %config.index,
        alias = ?config.alias,
        nodes = %config.node_list(),
        queue = %config.queue,
        "Indexing {} into {}",
        config.qualified_source(),
        config.index
    );

    let jar = find_es_hadoop_jar(&env.jars.search_paths);
    match &jar {
        Some(jar) => tracing::info!(jar = %jar.display(), "Using elasticsearch-hadoop jar"),
        None => tracing::warn!(
            "No elasticsearch-hadoop jar found, relying on Hive's auxiliary classpath"
        ),
    }

    let cli = HiveCli::new(env.hive.binary.clone(), env.hive.args.clone());
    let metadata = HiveMetadataProvider::new(cli.clone());
    let runner = HiveBatchRunner::new(cli);
    let admin =
        ElasticsearchAdmin::new(&config.nodes, &env.elasticsearch).map_err(Hive2EsError::from)?;
    let kinit = env
        .kerberos
        .enabled
        .then(|| KinitRenewer::new(env.kerberos.kinit_binary.clone()));

    let orchestrator = Orchestrator::new(&config, &metadata, &runner, &admin)
        .with_renewer(kinit.as_ref().map(|k| k as &dyn CredentialRenewer))
        .with_jar(jar.as_deref())
        .with_shutdown(shutdown);

    let outcome = tokio::time::timeout(config.timeout, orchestrator.run()).await;

    let report = match outcome {
        Ok(report) => report?,
        Err(_) => {
            return Err(Hive2EsError::from(LoadError::TimedOut {
                timeout: config.timeout,
            })
            .into())
        }
    };
    let report = report.into_result().map_err(Hive2EsError::from)?;
    Ok(report)
}
