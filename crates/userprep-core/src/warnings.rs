pub fn emit(message: &str) {
    log::warn!("{message}");
}
