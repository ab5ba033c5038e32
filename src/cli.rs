use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cluster-assessment")]
#[command(about = "Kubernetes cluster configuration assessment engine")]
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

    /// List AssessmentRequests and their last-run summary
    List,

    /// Run one on-demand assessment and print the result
    Run {
        /// Name of the AssessmentRequest
        name: String,
    },

    /// Manage the AssessmentRequest/ProfileOverride/Snapshot CRDs
    Crd {
        #[command(subcommand)]
        action: CrdAction,
    },

    /// Start the assessment reconcile loop
    Reconcile,

    /// Inspect built-in and custom profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Inspect built-in request bundles
    Bundle {
        #[command(subcommand)]
        action: BundleAction,
    },
}

#[derive(Subcommand)]
pub enum CrdAction {
    /// Print the CRD YAML for all three kinds to stdout
    Generate,

    /// Install the CRDs into the connected cluster
    Install,
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// List the built-in profile names
    List,

    /// Show the resolved configuration for a profile (built-in or override)
    Show {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum BundleAction {
    /// List all available request bundles
    List,

    /// Show a bundle's AssessmentRequestSpec as YAML
    Show {
        name: String,
    },

    /// Generate an AssessmentRequest YAML from a bundle template
    Apply {
        name: String,
        /// Name for the generated AssessmentRequest
        request_name: String,
    },
}
