extern crate winres;

fn main() {
    if cfg!(target_os = "windows") {
        let res = winres::WindowsResource::new();
        // the proxy is a DLL so there is no icon, but winres still copies the
        // package.metadata.winres values from Cargo.toml into the version resource.
        if let Err(e) = res.compile() {
            println!("cargo:warning=failed to embed version resource: {}", e);
        }
    }
}
