use std::collections::{BTreeMap, BTreeSet};

use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face as TtfFace;

use crate::error::Error;

/// The five faces a document can draw with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    Regular,
    Bold,
    Italic,
    BoldItalic,
    Mono,
}

impl Face {
    pub const ALL: [Face; 5] = [
        Face::Regular,
        Face::Bold,
        Face::Italic,
        Face::BoldItalic,
        Face::Mono,
    ];

    pub(crate) fn from_flags(bold: bool, italic: bool) -> Face {
        match (bold, italic) {
            (true, true) => Face::BoldItalic,
            (true, false) => Face::Bold,
            (false, true) => Face::Italic,
            (false, false) => Face::Regular,
        }
    }

    fn base_font(self) -> &'static [u8] {
        match self {
            Face::Regular => b"Helvetica",
            Face::Bold => b"Helvetica-Bold",
            Face::Italic => b"Helvetica-Oblique",
            Face::BoldItalic => b"Helvetica-BoldOblique",
            Face::Mono => b"Courier",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Caller-supplied TrueType/OpenType data, keyed by the face it replaces.
/// Faces without an entry use the standard PDF fonts.
#[derive(Clone, Debug, Default)]
pub struct CustomFonts<'a> {
    faces: BTreeMap<Face, &'a [u8]>,
}

impl<'a> CustomFonts<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_face(mut self, face: Face, data: &'a [u8]) -> Self {
        self.faces.insert(face, data);
        self
    }

    pub fn set(&mut self, face: Face, data: &'a [u8]) {
        self.faces.insert(face, data);
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) widths_1000: Vec<f32>,
    pub(crate) ascender_ratio: f32,
    pub(crate) char_to_gid: Option<BTreeMap<char, u16>>,
    pub(crate) char_widths_1000: Option<BTreeMap<char, f32>>,
}

impl FontEntry {
    /// Width of a single character in 1000-units. Uses the per-char table of an
    /// embedded font when present, falls back to the WinAnsi table.
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000
            && let Some(&w) = map.get(&ch)
        {
            return w;
        }
        let byte = char_to_winansi(ch).unwrap_or(b'?');
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn word_width(&self, word: &str, font_size: f32) -> f32 {
        word.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub(crate) fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }

    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

/// Every face registered in one PDF, indexed by [`Face`].
pub(crate) struct FontSet {
    entries: Vec<FontEntry>,
}

impl FontSet {
    pub(crate) fn get(&self, face: Face) -> &FontEntry {
        &self.entries[face.index()]
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &FontEntry> {
        self.entries.iter()
    }
}

/// Register all five faces in `pdf`. `used_chars` drives subsetting of
/// embedded fonts; standard fonts ignore it.
pub(crate) fn register_fonts(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    custom: &CustomFonts,
    used_chars: &BTreeMap<Face, BTreeSet<char>>,
) -> Result<FontSet, Error> {
    let empty = BTreeSet::new();
    let mut entries = Vec::with_capacity(Face::ALL.len());
    for face in Face::ALL {
        let t0 = std::time::Instant::now();
        let pdf_name = format!("F{}", face.index() + 1);
        let font_ref = alloc();
        let entry = match custom.faces.get(&face) {
            Some(data) => {
                let mut used = used_chars.get(&face).unwrap_or(&empty).clone();
                // Ensure space is always included
                used.insert(' ');
                embed_truetype(pdf, font_ref, face, pdf_name, data, &used, alloc)?
            }
            None => {
                pdf.type1_font(font_ref)
                    .base_font(Name(face.base_font()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
                standard_entry(face, pdf_name, font_ref)
            }
        };
        log::debug!(
            "register_font: {face:?} → {} {:.1}ms",
            entry.pdf_name,
            t0.elapsed().as_secs_f64() * 1000.0,
        );
        entries.push(entry);
    }
    Ok(FontSet { entries })
}

fn standard_entry(face: Face, pdf_name: String, font_ref: Ref) -> FontEntry {
    let (widths_1000, ascender_ratio) = match face {
        Face::Regular | Face::Italic => (helvetica_widths(false), 0.718),
        Face::Bold | Face::BoldItalic => (helvetica_widths(true), 0.718),
        Face::Mono => (vec![600.0; 224], 0.629),
    };
    FontEntry {
        pdf_name,
        font_ref,
        widths_1000,
        ascender_ratio,
        char_to_gid: None,
        char_widths_1000: None,
    }
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}', // bullet
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte.
fn char_to_winansi(c: char) -> Option<u8> {
    let byte = match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Characters outside the code page become `?`; tabs become a space.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            '\t' => b' ',
            _ => char_to_winansi(c).unwrap_or(b'?'),
        })
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &BTreeMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a..m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n..z
    389, 280, 389, 584, // {..~
];

/// Helvetica widths at 1000 units/em for WinAnsi bytes 32..=255. ASCII comes
/// from the font metrics; the upper half is approximated.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    let ascii = if bold { &HELVETICA_BOLD_ASCII } else { &HELVETICA_ASCII };
    (32u8..=255u8)
        .map(|b| match b {
            32..=126 => ascii[(b - 32) as usize] as f32,
            0x85 | 0x97 | 0x89 | 0x99 => 1000.0, // ellipsis, em dash, per mille, trademark
            0x95 => 350.0,                       // bullet
            0x91 | 0x92 | 0x82 => if bold { 278.0 } else { 222.0 },
            0x93 | 0x94 | 0x84 => if bold { 500.0 } else { 333.0 },
            0xA0 => 278.0,
            _ => if bold { 611.0 } else { 556.0 },
        })
        .collect()
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to only include glyphs used in the document.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    face_kind: Face,
    pdf_name: String,
    font_data: &[u8],
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<FontEntry, Error> {
    let face = TtfFace::parse(font_data, 0)
        .map_err(|e| Error::Font(format!("{face_kind:?}: cannot parse font data: {e}")))?;
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    let advance_1000 = |ch: char| {
        face.glyph_index(ch)
            .and_then(|gid| face.glyph_hor_advance(gid))
            .map(|adv| adv as f32 / units * 1000.0)
    };

    // WinAnsi widths, used for characters the font has no glyph for
    let widths_1000: Vec<f32> = (32u8..=255u8)
        .map(|byte| advance_1000(winansi_to_char(byte)).unwrap_or(0.0))
        .collect();

    // Ordered maps keep the subset, width array and CMap byte-identical across runs
    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = BTreeMap::new();
    let mut char_widths_1000 = BTreeMap::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            char_to_gid.insert(ch, new_gid);
            char_widths_1000.insert(ch, advance_1000(ch).unwrap_or(0.0));
        }
    }

    let subset_data = subsetter::subset(font_data, 0, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {face_kind:?}: {e}, embedding full font");
        font_data.to_vec()
    });

    let data_len = i32::try_from(subset_data.len())
        .map_err(|_| Error::Font(format!("{face_kind:?}: font data too large")))?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = face
        .names()
        .into_iter()
        .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME && n.is_unicode())
        .and_then(|n| n.to_string())
        .unwrap_or_else(|| format!("Custom{face_kind:?}"))
        .replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };

    let cid_font_ref = alloc();
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = char_to_gid
            .iter()
            .map(|(ch, &new_gid)| (new_gid, char_widths_1000[ch]))
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        gid_widths.dedup_by_key(|&mut (gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: pdf_writer::Str(b"Adobe"),
            ordering: pdf_writer::Str(b"Identity"),
            supplement: 0,
        },
    );
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(FontEntry {
        pdf_name,
        font_ref,
        widths_1000,
        ascender_ratio: face.ascender() as f32 / units,
        char_to_gid: Some(char_to_gid),
        char_widths_1000: Some(char_widths_1000),
    })
}
