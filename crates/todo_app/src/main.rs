use todo_app::app::{run, AppConfig};

fn main() {
    tracing_subscriber::fmt::init();
    let outcome = AppConfig::from_env().and_then(run);
    if let Err(err) = outcome {
        tracing::error!("startup pass aborted: {err:#}");
        std::process::exit(1);
    }
}
