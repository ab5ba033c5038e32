use anyhow::Result;
use kube::CustomResourceExt;

use cluster_assessment_engine::crd::{AssessmentRequest, ProfileOverride, Snapshot};

/// Print the YAML for all three CRDs to stdout for `kubectl apply -f`.
pub fn generate() -> Result<()> {
    for yaml in [
        serde_yaml::to_string(&AssessmentRequest::crd())?,
        serde_yaml::to_string(&ProfileOverride::crd())?,
        serde_yaml::to_string(&Snapshot::crd())?,
    ] {
        println!("---");
        println!("{yaml}");
    }
    Ok(())
}

/// Apply all three CRDs directly to the connected cluster.
pub async fn install() -> Result<()> {
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
    use kube::{Api, Client};

    let client = Client::try_default().await?;
    let crds: Api<CustomResourceDefinition> = Api::all(client);

    for crd in [AssessmentRequest::crd(), ProfileOverride::crd(), Snapshot::crd()] {
        let name = crd.metadata.name.clone().unwrap_or_default();
        match crds.create(&Default::default(), &crd).await {
            Ok(_) => println!("CRD '{name}' installed successfully"),
            Err(kube::Error::Api(err)) if err.code == 409 => {
                println!("CRD '{name}' already exists, skipping")
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
