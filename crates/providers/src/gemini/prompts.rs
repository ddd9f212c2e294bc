use reel_core::VideoFormat;

const METADATA_SCRIPT_EXCERPT_CHARS: usize = 500;

pub fn script_prompt(topic: &str, format: VideoFormat) -> String {
    match format {
        VideoFormat::Portrait => format!(
            "Write a 30-45 second YouTube Shorts video script.\n\
             Topic: {topic}\n\
             Requirements:\n\
             - Maximum 30-45 seconds when read aloud\n\
             - Fast-paced, punchy, and attention-grabbing\n\
             - Include a hook in the first 3 seconds\n\
             - Use very short sentences suitable for voiceover\n\
             - Keep it concise, this is a Short and not a full video\n\
             - Do NOT include stage directions, timestamps, or formatting marks\n\
             - Just return the spoken narration text"
        ),
        VideoFormat::Landscape => format!(
            "Write a 60-90 second YouTube video script.\n\
             Topic: {topic}\n\
             Requirements:\n\
             - Clear, engaging, and educational tone\n\
             - Include a hook in the first 5 seconds\n\
             - Use short sentences suitable for voiceover\n\
             - Do NOT include stage directions, timestamps, or formatting marks\n\
             - Just return the spoken narration text"
        ),
    }
}

pub fn scenes_prompt(script: &str, scene_count: usize) -> String {
    format!(
        "Split the following video script into {scene_count} visual scenes.\n\
         For each scene, give a short (3-8 word) image search description \
         that would find a good stock photo for that part of the script.\n\n\
         Script:\n{script}\n\n\
         Return ONLY a JSON array of strings, nothing else. Example:\n\
         [\"student studying with laptop\", \"online learning dashboard\"]"
    )
}

pub fn metadata_prompt(topic: &str, script: &str) -> String {
    let excerpt: String = script.chars().take(METADATA_SCRIPT_EXCERPT_CHARS).collect();
    format!(
        "For a YouTube video about '{topic}' with this script:\n\n\
         {excerpt}\n\n\
         Generate:\n\
         1. A catchy YouTube title (max 70 chars)\n\
         2. A YouTube description (2-3 sentences + relevant hashtags)\n\
         3. 8 comma-separated tags\n\n\
         Format your response EXACTLY like this:\n\
         TITLE: <title>\n\
         DESCRIPTION: <description>\n\
         TAGS: <tag1>, <tag2>, ..."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_prompt_depends_on_format() {
        let short = script_prompt("daily tip", VideoFormat::Portrait);
        let long = script_prompt("daily tip", VideoFormat::Landscape);
        assert!(short.contains("30-45 second YouTube Shorts"));
        assert!(long.contains("60-90 second YouTube video"));
        assert!(long.contains("Topic: daily tip\n"));
    }

    #[test]
    fn test_scenes_prompt_requests_json() {
        let prompt = scenes_prompt("Lava is hot.", 6);
        assert!(prompt.starts_with("Split the following video script into 6 visual scenes."));
        assert!(prompt.contains("Script:\nLava is hot.\n"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn test_metadata_prompt_truncates_script() {
        let script = "é".repeat(800);
        let prompt = metadata_prompt("volcanoes", &script);
        assert_eq!(prompt.matches('é').count(), 500);
        assert!(prompt.contains("TITLE: <title>"));
    }
}
