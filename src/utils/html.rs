// src/utils/html.rs

/// Sanitizes authored rich text (question content, options, explanations).
///
/// Whitelist based: formatting tags such as <b>, <sub> or <img> survive,
/// <script>, <iframe> and event-handler attributes are stripped.
/// Review pages render the frozen snapshot as HTML, so anything stored here ends up there.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input.trim())
}
