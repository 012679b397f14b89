use anyhow::Result;
use regex::Regex;

/// Everything the scrubbing chain learned about one markdown body
#[derive(Debug, Clone, Default)]
pub struct ScrubOutcome {
    /// Body text after the full substitution chain
    pub text: String,

    /// Whitespace-separated words remaining after scrubbing
    pub words: u64,

    /// Embedded picture links (.svg/.gif/.png/.jpg/.jpeg)
    pub pics: u64,

    /// External markdown links
    pub links: u64,

    /// Embedded YouTube watch URLs, in order of appearance
    pub video_urls: Vec<String>,

    /// Linked PDF assets, in order of appearance
    pub pdf_assets: Vec<String>,

    /// Directly linked media files (.mp4/.webm/.mov), in order of appearance
    pub media_assets: Vec<String>,
}

/// Markdown scrubber that strips markup and counts what it removes.
///
/// The substitution order matters and mirrors the metadata the platform
/// has always produced: video embeds go before generic links (so embeds
/// are not counted as links), links go before pictures (so remotely hosted
/// pictures count as links, not pics), and the character sweep runs last.
pub struct TextScrubber {
    comment_re: Regex,
    youtube_re: Regex,
    youtube_embed_re: Regex,
    external_link_re: Regex,
    pka_re: Regex,
    pdf_re: Regex,
    media_re: Regex,
    picture_re: Regex,
    charset_re: Regex,
    whitespace_re: Regex,
}

impl TextScrubber {
    pub fn new() -> Result<Self> {
        Ok(Self {
            comment_re: Regex::new(r"<!--.*-->")?,
            youtube_re: Regex::new(r"https://www\.youtube\.com/watch\?v=[^)]+")?,
            youtube_embed_re: Regex::new(
                r"!\[youtube\]\(https://www\.youtube\.com/watch\?v=[^)]+\)",
            )?,
            external_link_re: Regex::new(r"\[.*?\]\(http.*?\)")?,
            pka_re: Regex::new(r"\[.*?\]\(.*?\.pka\)")?,
            pdf_re: Regex::new(r"\[.*?\]\((.*?\.pdf)\)")?,
            media_re: Regex::new(r"\[.*?\]\((.*?(?:\.mp4|\.webm|\.mov))\)")?,
            picture_re: Regex::new(r"\[.*?\]\(.*?(\.svg|\.gif|\.png|\.jpg|\.jpeg)\)")?,
            charset_re: Regex::new(r"[^а-яА-Яa-zA-Z0-9 -]")?,
            whitespace_re: Regex::new(r"\s{2,}")?,
        })
    }

    /// Remove markdown comments (`<!-- ... -->` within a single line)
    pub fn strip_comments(&self, text: &str) -> String {
        self.comment_re.replace_all(text, "").into_owned()
    }

    /// Find embedded YouTube watch URLs
    pub fn find_videos(&self, text: &str) -> Vec<String> {
        self.youtube_re
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Find linked PDF assets
    pub fn find_pdf_assets(&self, text: &str) -> Vec<String> {
        self.pdf_re
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect()
    }

    /// Find directly linked media files
    pub fn find_media_assets(&self, text: &str) -> Vec<String> {
        self.media_re
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect()
    }

    /// Run the full substitution chain over one markdown body
    pub fn scrub(&self, raw: &str) -> ScrubOutcome {
        // Comments first: markdown comments may themselves contain links
        // that must not be counted.
        let text = self.strip_comments(raw);
        let text = text.replace('\n', " ");

        let video_urls = self.find_videos(&text);
        let pdf_assets = self.find_pdf_assets(&text);
        let media_assets = self.find_media_assets(&text);

        // Drop video embeds before counting links so they count as videos
        // only.
        let text = self.youtube_embed_re.replace_all(&text, " ");

        let links = self.external_link_re.find_iter(&text).count() as u64;
        let text = self.external_link_re.replace_all(&text, " ");

        // Packet Tracer assets carry no readable text
        let text = self.pka_re.replace_all(&text, " ");

        let pics = self.picture_re.find_iter(&text).count() as u64;
        let text = self.picture_re.replace_all(&text, " ");

        let text = self.charset_re.replace_all(&text, " ");
        let text = self.whitespace_re.replace_all(&text, " ");

        let words = text.split_whitespace().count() as u64;

        ScrubOutcome {
            text: text.trim().to_string(),
            words,
            pics,
            links,
            video_urls,
            pdf_assets,
            media_assets,
        }
    }

    /// Word count of an already-plain text (used for extracted PDF text)
    pub fn plain_word_count(&self, text: &str) -> u64 {
        let text = self.charset_re.replace_all(text, " ");
        text.split_whitespace().count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrubber() -> TextScrubber {
        TextScrubber::new().unwrap()
    }

    #[test]
    fn test_comment_removal() {
        let out = scrubber().strip_comments("before <!-- hidden note --> after");
        assert_eq!(out, "before  after");
    }

    #[test]
    fn test_comment_removal_stays_on_one_line() {
        // An unterminated comment opener must not eat the following lines
        let out = scrubber().strip_comments("start <!-- open\nnext line");
        assert_eq!(out, "start <!-- open\nnext line");
    }

    #[test]
    fn test_video_discovery() {
        let body = "intro ![youtube](https://www.youtube.com/watch?v=dQw4w9WgXcQ) outro";
        let videos = scrubber().find_videos(body);
        assert_eq!(videos, vec!["https://www.youtube.com/watch?v=dQw4w9WgXcQ"]);
    }

    #[test]
    fn test_video_embeds_are_not_links() {
        let body = "watch ![youtube](https://www.youtube.com/watch?v=abc123) \
                    and read [docs](https://example.com/guide)";
        let outcome = scrubber().scrub(body);
        assert_eq!(outcome.video_urls.len(), 1);
        assert_eq!(outcome.links, 1);
    }

    #[test]
    fn test_picture_counting() {
        let body = "![diagram](img/topology.png) text ![icon](assets/router.svg)";
        let outcome = scrubber().scrub(body);
        assert_eq!(outcome.pics, 2);
        assert_eq!(outcome.words, 1);
    }

    #[test]
    fn test_remote_pictures_count_as_links() {
        // http-hosted pictures are swallowed by the link pass first,
        // matching the established metadata numbers
        let body = "![photo](https://cdn.example.com/photo.jpg) and ![local](pics/a.jpg)";
        let outcome = scrubber().scrub(body);
        assert_eq!(outcome.links, 1);
        assert_eq!(outcome.pics, 1);
    }

    #[test]
    fn test_pka_asset_removal() {
        let outcome = scrubber().scrub("Open [lab](activities/ospf_lab.pka) and follow along");
        assert_eq!(outcome.text, "Open and follow along");
        assert_eq!(outcome.words, 4);
    }

    #[test]
    fn test_pdf_asset_discovery() {
        let assets = scrubber().find_pdf_assets("See [cheat sheet](sheets/subnetting.pdf)");
        assert_eq!(assets, vec!["sheets/subnetting.pdf"]);
    }

    #[test]
    fn test_word_count_mixed_alphabets() {
        let outcome = scrubber().scrub("Маршрутизатор router настроен, interface up!");
        assert_eq!(outcome.words, 5);
    }

    #[test]
    fn test_whitespace_collapse() {
        let outcome = scrubber().scrub("one\n\n\ntwo     three");
        assert_eq!(outcome.text, "one two three");
        assert_eq!(outcome.words, 3);
    }

    #[test]
    fn test_full_chain() {
        let body = "<!-- draft -->\n# OSPF Basics\n\
                    ![youtube](https://www.youtube.com/watch?v=abc)\n\
                    Read [RFC 2328](https://tools.ietf.org/rfc2328) first.\n\
                    ![area diagram](img/areas.png)\n\
                    Try [the lab](labs/ospf.pka) afterwards.";
        let outcome = scrubber().scrub(body);
        assert_eq!(outcome.video_urls.len(), 1);
        assert_eq!(outcome.links, 1);
        assert_eq!(outcome.pics, 1);
        // "OSPF Basics Read first Try afterwards"
        assert_eq!(outcome.words, 6);
    }
}
