fn main() {
    println!("cargo:rerun-if-changed=assets/joypad.html");
    println!("cargo:rerun-if-changed=assets/joypad_light.html");
    println!("cargo:rerun-if-env-changed=RCCAR_CONFIG");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
