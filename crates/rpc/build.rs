//! Build script for the planner's gRPC contracts.
//!
//! Compiles the Protocol Buffer definitions into Rust code using
//! tonic-build. The generated code provides the client stubs for the model
//! gateway, the memory retrieval service, and the sandbox tool service.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        let protoc_path = protoc_bin_vendored::protoc_bin_path()?;
        std::env::set_var("PROTOC", protoc_path);
    }

    tonic_build::configure()
        // This process is a pure client of all three services
        .build_server(false)
        .build_client(true)
        .compile_protos(&["proto/pagi.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/pagi.proto");

    Ok(())
}
