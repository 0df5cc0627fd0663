use chronoline_core::normalize_image_url;

fn normalized(raw: &str) -> Option<String> {
    normalize_image_url(raw)
}

#[test]
fn thumbnail_paths_resolve_to_the_original_file() {
    assert_eq!(
        normalized(
            "https://upload.wikimedia.org/wikipedia/commons/thumb/a/ab/Eiffel_Tower.jpg/320px-Eiffel_Tower.jpg"
        )
        .as_deref(),
        Some("https://upload.wikimedia.org/wikipedia/commons/a/ab/Eiffel_Tower.jpg")
    );
}

#[test]
fn protocol_relative_urls_become_https() {
    assert_eq!(
        normalized("//upload.wikimedia.org/wikipedia/commons/thumb/1/1f/X.png/120px-X.png")
            .as_deref(),
        Some("https://upload.wikimedia.org/wikipedia/commons/1/1f/X.png")
    );
    assert_eq!(
        normalized("//cdn.example.org/pic.jpg").as_deref(),
        Some("https://cdn.example.org/pic.jpg")
    );
}

#[test]
fn file_pages_on_any_wiki_host_become_file_path_links() {
    assert_eq!(
        normalized("https://commons.wikimedia.org/wiki/File:Great Wall.JPG").as_deref(),
        Some("https://commons.wikimedia.org/wiki/Special:FilePath/Great_Wall.JPG")
    );
    assert_eq!(
        normalized("https://de.wikipedia.org/wiki/Image:Berlin.png?uselang=en").as_deref(),
        Some("https://commons.wikimedia.org/wiki/Special:FilePath/Berlin.png")
    );
}

#[test]
fn bare_file_names_become_file_path_links() {
    assert_eq!(
        normalized("Rosetta Stone.jpg").as_deref(),
        Some("https://commons.wikimedia.org/wiki/Special:FilePath/Rosetta_Stone.jpg")
    );
    assert_eq!(
        normalized("Image:Map.svg").as_deref(),
        Some("https://commons.wikimedia.org/wiki/Special:FilePath/Map.svg")
    );
}

#[test]
fn plain_text_and_other_hosts_pass_through_trimmed() {
    assert_eq!(normalized("  not an image ").as_deref(), Some("not an image"));
    assert_eq!(
        normalized("https://images.example.com/photos/1.webp").as_deref(),
        Some("https://images.example.com/photos/1.webp")
    );
}

#[test]
fn blank_values_are_none() {
    assert_eq!(normalized(""), None);
    assert_eq!(normalized(" \t "), None);
}
