#[cfg(target_os = "windows")]
fn main() {
    use winresource::WindowsResource;

    // L'icona è opzionale: senza res/fleetlog.ico il binario resta senza risorse
    if !std::path::Path::new("res/fleetlog.ico").exists() {
        return;
    }

    let mut res = WindowsResource::new();
    res.set_icon("res/fleetlog.ico")
        .set("FileDescription", "fleetlog CLI")
        .set("ProductName", "fleetlog")
        .set("OriginalFilename", "fleetlog.exe")
        .set("FileVersion", env!("CARGO_PKG_VERSION"))
        .set("ProductVersion", env!("CARGO_PKG_VERSION"))
        .compile()
        .expect("Failed to embed icon resource");
}

#[cfg(not(target_os = "windows"))]
fn main() {}
