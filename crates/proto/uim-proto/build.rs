fn main() {
    let protos = [
        "proto/uim/input.proto",
        "proto/uim/sensor_data.proto",
        "proto/uim/brushes.proto",
        "proto/uim/ink_data.proto",
        "proto/uim/ink_structure.proto",
        "proto/uim/triples.proto",
        "proto/uim/properties.proto",
        "proto/uim/sections.proto",
        "proto/uim/legacy.proto",
    ];
    for proto in protos {
        println!("cargo:rerun-if-changed={proto}");
    }

    // protobuf-JSON is a read-only helper surface (§4.9 "File extensions",
    // `.json`); every generated message round-trips through serde_json so
    // `uim::parse_json` can load one without a hand-written JSON schema.
    prost_build::Config::new()
        .type_attribute(".", "#[derive(serde::Serialize, serde::Deserialize)]")
        .compile_protos(&protos, &["proto"])
        .expect("failed to compile uim .proto schema");
}
