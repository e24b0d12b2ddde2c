use jira_kpi::commands::Cli;
use jira_kpi::libs::logging::{init_tracing, DEFAULT_LEVEL};
use jira_kpi::libs::messages::Message;
use jira_kpi::msg_error;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing(DEFAULT_LEVEL);

    if let Err(e) = Cli::menu().await {
        msg_error!(Message::CommandFailed(format!("{:#}", e)));
        std::process::exit(1);
    }
}
