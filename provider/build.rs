fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protos = [
        "../proto/tfplugin6/tfplugin6.proto",
        "../proto/plugin/grpc_controller.proto",
        "../proto/grpc/health/v1/health.proto",
    ];

    for proto in &protos {
        println!("cargo:rerun-if-changed={}", proto);
    }

    tonic_build::configure()
        // Terraform is always the client; only server stubs are generated.
        .build_client(false)
        .build_server(true)
        .compile(&protos, &["../proto"])?;

    Ok(())
}
