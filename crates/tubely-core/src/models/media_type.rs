/// File extension for a media type: the subtype after `/`, or `bin`.
///
/// `video/mp4` -> `mp4`. Parameters such as `; codecs=...` are ignored.
pub fn media_type_to_ext(media_type: &str) -> String {
    let essence = media_type.split(';').next().unwrap_or("").trim();
    match essence.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => subtype.to_lowercase(),
        _ => "bin".to_string(),
    }
}
