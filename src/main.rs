use verify_sender::configuration::get_configuration;
use verify_sender::console::Console;
use verify_sender::telemetry::get_subscriber;
use verify_sender::telemetry::init_subscriber;
use verify_sender::workflow::Workflow;

/// Initialise telemetry, load config, then walk the operator through
/// verification. Only fatal errors produce a non-zero exit; rejected API calls
/// are reported on stdout and the run still completes.
#[tokio::main] // requires tokio features: macros, rt-multi-thread
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("verify-sender", "warn", std::io::stderr);
    init_subscriber(subscriber);

    // the api key is checked here, before any request is made
    let cfg = get_configuration()?;

    let mut workflow = Workflow::build(cfg)?;
    let mut console = Console::stdio();

    match workflow.run(&mut console).await {
        Ok(report) => {
            tracing::info!(
                registration = %report.registration,
                verification = %report.verification,
                "run finished"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                state = ?workflow.state(),
                "run aborted"
            );
            Err(e.into())
        }
    }
}
