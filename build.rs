fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Ensure protoc is available even when not installed on the host system.
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    // Compile the protobuf file into Rust code
    tonic_prost_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_protos(&["proto/transctrl.proto"], &["proto"])?;
    
    Ok(())
}
