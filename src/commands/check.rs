use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::api::rbac::v1::ClusterRoleBinding;
use kube::api::ListParams;
use kube::{Api, Client};

pub async fn run() -> anyhow::Result<()> {
    println!("Running cluster connectivity checks...\n");

    print!("  Kubeconfig .................. ");
    let client = match Client::try_default().await {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAIL");
            anyhow::bail!("Cannot load kubeconfig: {}", e);
        }
    };

    print!("  Cluster connection .......... ");
    let version = match client.apiserver_version().await {
        Ok(v) => {
            println!("OK (v{}.{})", v.major, v.minor);
            Some(v)
        }
        Err(e) => {
            println!("FAIL");
            println!("\n  Error: {}", e);
            println!("  Hint:  Is the cluster running? Check with: kubectl cluster-info\n");
            return Ok(());
        }
    };

    print!("  List nodes permission ........ ");
    let nodes: Api<Node> = Api::all(client.clone());
    match nodes.list(&ListParams::default()).await {
        Ok(node_list) => println!("OK ({} nodes)", node_list.items.len()),
        Err(e) => println!("FAIL ({e})"),
    }

    print!("  List cluster role bindings ... ");
    let bindings: Api<ClusterRoleBinding> = Api::all(client.clone());
    match bindings.list(&ListParams::default()).await {
        Ok(list) => println!("OK ({} bindings)", list.items.len()),
        Err(e) => println!("FAIL ({e})"),
    }

    print!("  List network policies ........ ");
    let policies: Api<NetworkPolicy> = Api::all(client.clone());
    match policies.list(&ListParams::default()).await {
        Ok(list) => println!("OK ({} policies)", list.items.len()),
        Err(e) => println!("FAIL ({e})"),
    }

    if let Some(v) = version {
        println!("\n  Kubernetes version: {}.{}", v.major, v.minor);
    }

    println!("\nAll checks completed. Run 'cluster-assessment crd install' if the");
    println!("AssessmentRequest/ProfileOverride/Snapshot CRDs are not yet registered.");
    Ok(())
}
