//! RadioData XML rendering and parsing.

use std::io::Write;

use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::warn;

use radio_model::{Guid, Rgb};

use crate::common::{BROADCAST_ENTRY, CHANNEL_ENTRY, LINE_ENTRY, RADIO_DATA_ROOT};
use crate::document::{BroadcastNode, ChannelNode, LineNode, RadioDocument};
use crate::error::{CodecError, Result};

/// Render a document as indented UTF-8 XML.
pub fn write_document(document: &RadioDocument) -> Result<String> {
    let mut xml = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit(
        &mut xml,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    emit(&mut xml, Event::Start(BytesStart::new(RADIO_DATA_ROOT)))?;

    for channel in &document.channels {
        let mut node = BytesStart::new(CHANNEL_ENTRY);
        let frequency = channel.frequency.to_string();
        node.push_attribute(("ID", channel.id.as_str()));
        node.push_attribute(("name", channel.name.as_str()));
        node.push_attribute(("freq", frequency.as_str()));
        if channel.broadcasts.is_empty() {
            emit(&mut xml, Event::Empty(node))?;
            continue;
        }
        emit(&mut xml, Event::Start(node))?;

        for broadcast in &channel.broadcasts {
            let mut node = BytesStart::new(BROADCAST_ENTRY);
            let timestamp = broadcast.timestamp.to_string();
            let endstamp = broadcast.endstamp.to_string();
            let day = broadcast.day.to_string();
            node.push_attribute(("ID", broadcast.id.as_str()));
            node.push_attribute(("timestamp", timestamp.as_str()));
            node.push_attribute(("endstamp", endstamp.as_str()));
            node.push_attribute(("day", day.as_str()));
            if broadcast.lines.is_empty() {
                emit(&mut xml, Event::Empty(node))?;
                continue;
            }
            emit(&mut xml, Event::Start(node))?;
            for line in &broadcast.lines {
                write_line(&mut xml, line)?;
            }
            emit(&mut xml, Event::End(BytesEnd::new(BROADCAST_ENTRY)))?;
        }

        emit(&mut xml, Event::End(BytesEnd::new(CHANNEL_ENTRY)))?;
    }

    emit(&mut xml, Event::End(BytesEnd::new(RADIO_DATA_ROOT)))?;
    let mut bytes = xml.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(render_failed)
}

fn write_line<W: Write>(xml: &mut Writer<W>, line: &LineNode) -> Result<()> {
    let mut node = BytesStart::new(LINE_ENTRY);
    if let Some(id) = &line.id {
        node.push_attribute(("ID", id.as_str()));
    }
    if let Some(rgb) = line.rgb {
        let (r, g, b) = (rgb.r.to_string(), rgb.g.to_string(), rgb.b.to_string());
        node.push_attribute(("r", r.as_str()));
        node.push_attribute(("g", g.as_str()));
        node.push_attribute(("b", b.as_str()));
    }
    if line.text.is_empty() {
        return emit(xml, Event::Empty(node));
    }
    emit(xml, Event::Start(node))?;
    emit(xml, Event::Text(BytesText::new(&line.text)))?;
    emit(xml, Event::End(BytesEnd::new(LINE_ENTRY)))
}

fn emit<W: Write>(xml: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    xml.write_event(event).map_err(render_failed)
}

fn render_failed(error: impl std::fmt::Display) -> CodecError {
    CodecError::Render(error.to_string())
}

// ----------------------------------------------------------------------------
// Parsing
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Root,
    Channel,
    Broadcast,
    Line,
    Other,
}

/// Decode raw document bytes to text.
///
/// A byte order mark wins, then the `encoding` of the XML declaration, then
/// UTF-8. Bytes that are not valid in the chosen encoding make the document
/// malformed.
pub fn decode_document(bytes: &[u8]) -> Result<String> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (declared_encoding(bytes)?.unwrap_or(UTF_8), bytes),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| {
            CodecError::malformed(format!("document is not valid {}", encoding.name()))
        })
}

/// Encoding named by the XML declaration, if any.
fn declared_encoding(bytes: &[u8]) -> Result<Option<&'static Encoding>> {
    if !bytes.starts_with(b"<?xml") {
        return Ok(None);
    }
    let Some(end) = bytes.windows(2).position(|pair| pair == b"?>") else {
        return Ok(None);
    };
    let declaration = String::from_utf8_lossy(&bytes[..end]);
    let Some(start) = declaration.find("encoding") else {
        return Ok(None);
    };
    let rest = declaration[start + "encoding".len()..].trim_start();
    let Some(rest) = rest.strip_prefix('=').map(str::trim_start) else {
        return Err(CodecError::malformed("malformed encoding declaration"));
    };
    let mut chars = rest.chars();
    let quote = match chars.next() {
        Some(quote @ ('"' | '\'')) => quote,
        _ => return Err(CodecError::malformed("malformed encoding declaration")),
    };
    let label = chars.as_str().split(quote).next().unwrap_or_default();
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| CodecError::malformed(format!("unsupported encoding {label}")))?;
    // No BOM means ASCII-compatible bytes; a UTF-16 label reads as UTF-8.
    Ok(Some(encoding.output_encoding()))
}

/// Parse RadioData XML into a document tree.
///
/// Unknown elements between the root and the channel entries are skipped.
/// Missing optional attributes take their defaults; attributes that are
/// present but unparseable, misplaced entries, or broken XML make the whole
/// document malformed.
pub fn parse_document(xml: &str) -> Result<RadioDocument> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    let mut document = RadioDocument::default();
    let mut stack: Vec<Element> = Vec::new();
    let mut saw_root = false;
    let mut text = String::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            CodecError::malformed(format!(
                "xml parse error at position {}: {e}",
                reader.buffer_position()
            ))
        })?;
        match event {
            Event::Start(e) => {
                let element = open_element(&mut document, &stack, &e, &mut saw_root)?;
                if element == Element::Line {
                    text.clear();
                }
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = open_element(&mut document, &stack, &e, &mut saw_root)?;
                if element == Element::Line {
                    text.clear();
                    close_line(&mut document, &text);
                }
            }
            Event::End(_) => {
                if stack.pop() == Some(Element::Line) {
                    close_line(&mut document, &text);
                }
            }
            Event::Text(e) => {
                if stack.last() == Some(&Element::Line) {
                    text.push_str(&decode_text(&e)?);
                }
            }
            Event::CData(e) => {
                if stack.last() == Some(&Element::Line) {
                    let raw = std::str::from_utf8(&e)
                        .map_err(|err| CodecError::malformed(format!("invalid utf-8: {err}")))?;
                    text.push_str(raw);
                }
            }
            Event::GeneralRef(e) => {
                if stack.last() == Some(&Element::Line) {
                    let name = std::str::from_utf8(&e)
                        .map_err(|err| CodecError::malformed(format!("invalid utf-8: {err}")))?;
                    text.push(resolve_reference(name)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(CodecError::malformed(format!(
            "missing {RADIO_DATA_ROOT} root element"
        )));
    }
    if !stack.is_empty() {
        return Err(CodecError::malformed("unexpected end of document"));
    }
    Ok(document)
}

fn open_element(
    document: &mut RadioDocument,
    stack: &[Element],
    e: &BytesStart<'_>,
    saw_root: &mut bool,
) -> Result<Element> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let innermost = stack
        .iter()
        .rev()
        .copied()
        .find(|element| *element != Element::Other);

    if stack.is_empty() {
        if name != RADIO_DATA_ROOT || *saw_root {
            return Err(CodecError::malformed(format!(
                "unexpected root element <{name}>"
            )));
        }
        *saw_root = true;
        return Ok(Element::Root);
    }

    match name.as_str() {
        CHANNEL_ENTRY => {
            if innermost != Some(Element::Root) {
                return Err(misplaced(CHANNEL_ENTRY, RADIO_DATA_ROOT));
            }
            let attrs = Attributes::read(e)?;
            document.channels.push(ChannelNode {
                id: attrs.required("ID", CHANNEL_ENTRY)?,
                name: attrs.get("name").unwrap_or_default(),
                frequency: attrs
                    .parsed::<f64>("freq", CHANNEL_ENTRY)?
                    .or(attrs.parsed::<f64>("frequency", CHANNEL_ENTRY)?)
                    .unwrap_or(0.0),
                broadcasts: Vec::new(),
            });
            Ok(Element::Channel)
        }
        BROADCAST_ENTRY => {
            if innermost != Some(Element::Channel) {
                return Err(misplaced(BROADCAST_ENTRY, CHANNEL_ENTRY));
            }
            let attrs = Attributes::read(e)?;
            let node = BroadcastNode {
                id: attrs.required("ID", BROADCAST_ENTRY)?,
                day: attrs.parsed::<i32>("day", BROADCAST_ENTRY)?.unwrap_or(0),
                timestamp: attrs.stamp("timestamp")?.unwrap_or(0),
                endstamp: attrs.stamp("endstamp")?.unwrap_or(0),
                lines: Vec::new(),
            };
            if let Some(channel) = document.channels.last_mut() {
                channel.broadcasts.push(node);
            }
            Ok(Element::Broadcast)
        }
        LINE_ENTRY => {
            if innermost != Some(Element::Broadcast) {
                return Err(misplaced(LINE_ENTRY, BROADCAST_ENTRY));
            }
            let attrs = Attributes::read(e)?;
            let id = match attrs.get("ID") {
                Some(raw) => match Guid::parse(raw.as_str()) {
                    Ok(guid) => Some(guid),
                    Err(err) => {
                        warn!("ignoring unusable line identity: {err}");
                        None
                    }
                },
                None => None,
            };
            let node = LineNode {
                id,
                text: String::new(),
                rgb: attrs.rgb()?,
            };
            if let Some(broadcast) = current_broadcast(document) {
                broadcast.lines.push(node);
            }
            Ok(Element::Line)
        }
        other => {
            if innermost == Some(Element::Line) {
                return Err(CodecError::malformed(format!(
                    "unexpected <{other}> inside {LINE_ENTRY}"
                )));
            }
            Ok(Element::Other)
        }
    }
}

fn current_broadcast(document: &mut RadioDocument) -> Option<&mut BroadcastNode> {
    document
        .channels
        .last_mut()
        .and_then(|channel| channel.broadcasts.last_mut())
}

fn close_line(document: &mut RadioDocument, text: &str) {
    if let Some(line) = current_broadcast(document).and_then(|b| b.lines.last_mut()) {
        line.text = normalize_line_text(text);
    }
}

/// Line text as it reads back from a document: LF line endings, trimmed.
pub fn normalize_line_text(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

fn misplaced(element: &str, parent: &str) -> CodecError {
    CodecError::malformed(format!("<{element}> must be nested in <{parent}>"))
}

fn decode_text(e: &BytesText<'_>) -> Result<String> {
    let raw = std::str::from_utf8(e)
        .map_err(|err| CodecError::malformed(format!("invalid utf-8: {err}")))?;
    quick_xml::escape::unescape(raw)
        .map(|text| text.into_owned())
        .map_err(|err| CodecError::malformed(format!("bad escape in text: {err}")))
}

fn resolve_reference(name: &str) -> Result<char> {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name.strip_prefix('#').and_then(|code| {
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse::<u32>().ok(),
            };
            value.and_then(char::from_u32)
        }),
    };
    resolved.ok_or_else(|| CodecError::malformed(format!("unknown entity &{name};")))
}

/// Attributes of one element, keys matched case-insensitively.
struct Attributes {
    element: String,
    values: Vec<(String, String)>,
}

impl Attributes {
    fn read(e: &BytesStart<'_>) -> Result<Self> {
        let element = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        let mut values = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| {
                CodecError::malformed(format!("bad attribute on <{element}>: {err}"))
            })?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let raw = std::str::from_utf8(&attr.value)
                .map_err(|err| CodecError::malformed(format!("invalid utf-8: {err}")))?;
            let value = quick_xml::escape::unescape(raw).map_err(|err| {
                CodecError::malformed(format!("bad escape in {element}@{key}: {err}"))
            })?;
            values.push((key, value.into_owned()));
        }
        Ok(Self { element, values })
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.clone())
    }

    fn required(&self, key: &str, element: &str) -> Result<String> {
        match self.get(key) {
            Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(CodecError::malformed(format!(
                "<{element}> is missing its {key} attribute"
            ))),
        }
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str, element: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        raw.trim().parse::<T>().map(Some).map_err(|_| {
            CodecError::malformed(format!("<{element}> has non-numeric {key}={raw:?}"))
        })
    }

    /// Whole seconds. Fractional input is truncated, never kept.
    fn stamp(&self, key: &str) -> Result<Option<i64>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Ok(Some(value));
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value.trunc() as i64)),
            _ => Err(CodecError::malformed(format!(
                "<{}> has non-numeric {key}={raw:?}",
                self.element
            ))),
        }
    }

    /// `r`, `g`, `b` as bytes; all three must be present to count.
    fn rgb(&self) -> Result<Option<Rgb>> {
        let r = self.parsed::<u8>("r", &self.element)?;
        let g = self.parsed::<u8>("g", &self.element)?;
        let b = self.parsed::<u8>("b", &self.element)?;
        match (r, g, b) {
            (Some(r), Some(g), Some(b)) => Ok(Some(Rgb::new(r, g, b))),
            (None, None, None) => Ok(None),
            _ => {
                warn!("ignoring partial color on <{}>", self.element);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guid(value: &str) -> Guid {
        Guid::parse(value).unwrap()
    }

    fn sample() -> RadioDocument {
        RadioDocument {
            channels: vec![ChannelNode {
                id: "kpz".to_string(),
                name: "KPZ & Friends".to_string(),
                frequency: 98.4,
                broadcasts: vec![BroadcastNode {
                    id: "news".to_string(),
                    day: 1,
                    timestamp: 12,
                    endstamp: 90,
                    lines: vec![
                        LineNode {
                            id: Some(guid("g-1")),
                            text: "Tom & Jerry <live>".to_string(),
                            rgb: Some(Rgb::new(17, 34, 51)),
                        },
                        LineNode {
                            id: Some(guid("g-2")),
                            text: String::new(),
                            rgb: None,
                        },
                    ],
                }],
            }],
        }
    }

    #[test]
    fn test_write_then_parse_preserves_nodes() {
        let document = sample();
        let xml = write_document(&document).unwrap();
        assert_eq!(parse_document(&xml).unwrap(), document);
    }

    #[test]
    fn test_written_xml_shape() {
        let xml = write_document(&sample()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(r#"<ChannelEntry ID="kpz" name="KPZ &amp; Friends" freq="98.4">"#));
        assert!(xml.contains(r#"<BroadcastEntry ID="news" timestamp="12" endstamp="90" day="1">"#));
        assert!(xml.contains(
            r#"<LineEntry ID="g-1" r="17" g="34" b="51">Tom &amp; Jerry &lt;live&gt;</LineEntry>"#
        ));
        assert!(xml.contains(r#"<LineEntry ID="g-2"/>"#));
    }

    #[test]
    fn test_parse_tolerates_bom_whitespace_and_missing_attributes() {
        let xml = "\u{feff}<RadioData>\r\n  <Channels>\r\n    <ChannelEntry ID=\"c\">\r\n      \
                   <BroadcastEntry ID=\"b\">\r\n        <LineEntry ID=\"x\">\r\n  Hello\r\n  there  \
                   </LineEntry>\r\n      </BroadcastEntry>\r\n    </ChannelEntry>\r\n  </Channels>\r\n</RadioData>";
        let document = parse_document(xml).unwrap();
        let channel = &document.channels[0];
        assert_eq!(channel.name, "");
        assert_eq!(channel.frequency, 0.0);
        let broadcast = &channel.broadcasts[0];
        assert_eq!((broadcast.day, broadcast.timestamp, broadcast.endstamp), (0, 0, 0));
        assert_eq!(broadcast.lines[0].text, "Hello\n  there");
        assert_eq!(broadcast.lines[0].rgb, None);
    }

    #[test]
    fn test_parse_resolves_character_references() {
        let xml = r#"<RadioData><ChannelEntry ID="c"><BroadcastEntry ID="b"><LineEntry ID="x">A&#66;&#x43; &quot;q&quot;</LineEntry></BroadcastEntry></ChannelEntry></RadioData>"#;
        let document = parse_document(xml).unwrap();
        assert_eq!(document.channels[0].broadcasts[0].lines[0].text, "ABC \"q\"");
    }

    #[test]
    fn test_parse_truncates_fractional_stamps() {
        let xml = r#"<RadioData><ChannelEntry ID="c"><BroadcastEntry ID="b" timestamp="12.9" endstamp="-3.5"/></ChannelEntry></RadioData>"#;
        let broadcast = &parse_document(xml).unwrap().channels[0].broadcasts[0];
        assert_eq!(broadcast.timestamp, 12);
        assert_eq!(broadcast.endstamp, -3);
    }

    #[test]
    fn test_parse_keeps_line_without_usable_identity() {
        let xml = r#"<RadioData><ChannelEntry ID="c"><BroadcastEntry ID="b"><LineEntry>no id</LineEntry><LineEntry ID="  ">blank</LineEntry></BroadcastEntry></ChannelEntry></RadioData>"#;
        let lines = &parse_document(xml).unwrap().channels[0].broadcasts[0].lines;
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.id.is_none()));
    }

    #[test]
    fn test_parse_rejects_structural_problems() {
        let cases = [
            "",
            "<Other/>",
            "<RadioData><ChannelEntry ID=\"c\">",
            "<RadioData><LineEntry ID=\"x\">orphan</LineEntry></RadioData>",
            "<RadioData><ChannelEntry><BroadcastEntry ID=\"b\"/></ChannelEntry></RadioData>",
            "<RadioData><ChannelEntry ID=\"c\"><BroadcastEntry ID=\"b\" day=\"monday\"/></ChannelEntry></RadioData>",
            "<RadioData><ChannelEntry ID=\"c\"><BroadcastEntry ID=\"b\"><LineEntry ID=\"x\" r=\"red\" g=\"0\" b=\"0\">t</LineEntry></BroadcastEntry></ChannelEntry></RadioData>",
            "<RadioData></Mismatch>",
        ];
        for xml in cases {
            assert!(
                matches!(parse_document(xml), Err(CodecError::MalformedDocument { .. })),
                "{xml:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_decode_honors_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("<RadioData>Grüße</RadioData>".encode_utf16().flat_map(u16::to_le_bytes));
        assert_eq!(decode_document(&bytes).unwrap(), "<RadioData>Grüße</RadioData>");

        let utf8 = b"\xEF\xBB\xBF<RadioData/>";
        assert_eq!(decode_document(utf8).unwrap(), "<RadioData/>");
    }

    #[test]
    fn test_decode_honors_declared_encoding() {
        let bytes = b"<?xml version='1.0' encoding = 'ISO-8859-1'?><RadioData>caf\xE9</RadioData>";
        assert!(decode_document(bytes).unwrap().ends_with("<RadioData>caf\u{e9}</RadioData>"));

        // A UTF-16 label on ASCII-compatible bytes reads as UTF-8.
        let bytes = "<?xml version=\"1.0\" encoding=\"UTF-16\"?><RadioData>é</RadioData>";
        assert_eq!(decode_document(bytes.as_bytes()).unwrap(), bytes);
    }

    #[test]
    fn test_decode_rejects_bad_bytes_and_labels() {
        for bytes in [
            &b"<RadioData>caf\xE9</RadioData>"[..],
            &b"<?xml version=\"1.0\" encoding=\"klingon\"?><RadioData/>"[..],
            &b"<?xml version=\"1.0\" encoding=UTF-8?><RadioData/>"[..],
        ] {
            assert!(
                matches!(decode_document(bytes), Err(CodecError::MalformedDocument { .. })),
                "{bytes:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_partial_color_is_ignored() {
        let xml = r#"<RadioData><ChannelEntry ID="c"><BroadcastEntry ID="b"><LineEntry ID="x" r="1" g="2">t</LineEntry></BroadcastEntry></ChannelEntry></RadioData>"#;
        let document = parse_document(xml).unwrap();
        assert_eq!(document.channels[0].broadcasts[0].lines[0].rgb, None);
    }
}
