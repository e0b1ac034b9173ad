fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    // Packaged builds can pin the commit without a .git directory
    println!("cargo:rerun-if-env-changed=PEERSCORE_GIT_HASH");
    if let Ok(hash) = std::env::var("PEERSCORE_GIT_HASH") {
        println!("cargo:rustc-env=PEERSCORE_GIT_HASH={}", hash);
    }
}
