//! Speaker alternation correction for generated scripts.

use super::{join_segments, Speaker, Speakers};

/// Make speaker tags alternate.
///
/// First pass: within a segment, a labelled line that repeats the previous
/// speaker is relabelled to the other speaker. A line equal to the separator
/// resets the tracking, so each segment starts fresh.
///
/// Second pass: across each seam, if the first labelled line of a segment has
/// the same speaker as the last labelled line of the segment before it, the
/// first occurrence of that tag in the segment is swapped. Only that one line
/// changes; the rest of the segment is not re-alternated.
pub fn correct_alternation(script: &str, speakers: &Speakers, separator: &str) -> String {
    let relabelled = relabel_repeats(script, speakers, separator);

    let segments: Vec<&str> = relabelled.split(separator).collect();
    if segments.len() <= 1 {
        return relabelled;
    }

    let mut corrected: Vec<String> = Vec::with_capacity(segments.len());
    corrected.push(segments[0].to_string());

    for segment in &segments[1..] {
        let mut current = segment.trim().to_string();

        let previous_last = corrected
            .last()
            .and_then(|prev| prev.trim().lines().filter_map(|l| speakers.speaker_of(l)).last());
        let current_first = current.lines().find_map(|l| speakers.speaker_of(l));

        if let (Some(prev), Some(first)) = (previous_last, current_first) {
            if prev == first {
                current = current.replacen(
                    &speakers.tag(first),
                    &speakers.tag(first.other()),
                    1,
                );
            }
        }
        corrected.push(current);
    }

    join_segments(&corrected, separator)
}

fn relabel_repeats(script: &str, speakers: &Speakers, separator: &str) -> String {
    let mut last: Option<Speaker> = None;
    let mut lines: Vec<String> = Vec::new();

    for line in script.split('\n') {
        match speakers.speaker_of(line) {
            Some(current) if Some(current) == last => {
                let flipped = current.other();
                lines.push(format!(
                    "{} {}",
                    speakers.tag(flipped),
                    speakers.strip_tag(line, current)
                ));
                last = Some(flipped);
            }
            Some(current) => {
                lines.push(line.to_string());
                last = Some(current);
            }
            None => {
                lines.push(line.to_string());
                if line.trim() == separator {
                    last = None;
                }
            }
        }
    }

    lines.join("\n")
}
