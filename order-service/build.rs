use std::env::var;
use std::io::Result;

fn main() -> Result<()> {
    // List of proto files containing a service definition
    let proto_files = &["proto/order.proto"];

    // Name of the folder containing the proto definitions
    let proto_folder = "proto";
    let out_dir = var("OUT_DIR").expect("Missing OUT_DIR environment variable");
    let descriptors_path = format!("{}/descriptors.bin", out_dir);

    let mut config = tonic_prost_build::Config::new();
    config.protoc_executable(
        protoc_bin_vendored::protoc_bin_path().expect("No vendored protoc for this platform"),
    );

    tonic_prost_build::configure()
        .file_descriptor_set_path(descriptors_path)
        .build_client(false)
        .compile_with_config(config, proto_files, &[proto_folder])?;

    Ok(())
}
