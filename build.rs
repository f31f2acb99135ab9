//! Generates the gRPC bindings for the plugin protocol.
//!
//! Only the server halves are needed: Terraform is always the client.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protos = ["proto/tfplugin6.proto", "proto/grpc_controller.proto", "proto/grpc_health.proto"];

    for proto in &protos {
        println!("cargo:rerun-if-changed={proto}");
    }

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(&protos, &["proto"])?;

    Ok(())
}
