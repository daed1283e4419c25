use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "generalscaler")]
#[command(about = "Generic metric-driven Kubernetes autoscaler")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display application version
    Version,

    /// Check cluster connectivity and permissions
    Check,

    /// Manage the GeneralScaler CRD
    Crd {
        #[command(subcommand)]
        action: CrdAction,
    },

    /// Run the GeneralScaler operator reconcile loop
    Reconcile,

    /// Push synthetic jobs onto a Redis list, for exercising the redis metric provider
    DemoLoad {
        #[arg(long, default_value = "localhost")]
        host: String,
        #[arg(long, default_value_t = 6379)]
        port: u16,
        #[arg(long, default_value = "test-queue")]
        queue: String,
        #[arg(long, default_value_t = 50)]
        count: u32,
        #[arg(long, default_value_t = 5)]
        rate: u32,
    },
}

#[derive(Subcommand)]
pub enum CrdAction {
    /// Print the CRD YAML to stdout
    Generate,

    /// Install the CRD into the connected cluster
    Install,
}
