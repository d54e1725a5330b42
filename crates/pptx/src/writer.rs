//! PPTX package generation from slide plans.

use crate::constants::*;
use crate::layout::{plan_deck, Shape, SlidePlan, TextBlock};
use chrono::{Local, NaiveDate};
use deck_core::{Deck, Error, Result};
use quick_xml::escape::escape;
use regex::Regex;
use std::io::{Cursor, Seek, Write};
use std::sync::LazyLock;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Characters not allowed in suggested file names.
static FILE_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]").unwrap());

/// Code points XML 1.0 does not allow anywhere in a document.
static XML_ILLEGAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x{FFFE}\x{FFFF}]").unwrap());

/// Relationship id of the first slide in `presentation.xml.rels`.
/// rId1..rId6 are the masters, props, theme and table styles.
const FIRST_SLIDE_REL_ID: usize = 7;

/// Suggested download name for a deck title, e.g. `Q3 Plan!` -> `Q3_Plan_.pptx`.
pub fn file_name_for(title: &str) -> String {
    format!("{}.pptx", FILE_NAME_REGEX.replace_all(title, "_"))
}

/// A rendered document and its suggested file name.
#[derive(Debug, Clone)]
pub struct RenderedDeck {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Renders validated decks into PPTX bytes.
#[derive(Debug, Clone)]
pub struct PptxRenderer {
    /// Date shown on the title slide; today when unset.
    date: Option<NaiveDate>,

    /// Author recorded in the document properties.
    author: String,
}

impl Default for PptxRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PptxRenderer {
    pub fn new() -> Self {
        Self {
            date: None,
            author: "deckgen".to_string(),
        }
    }

    /// Pin the title slide date instead of using today's date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Render a deck into a PPTX package with `1 + deck.slides.len()` slides.
    ///
    /// The same deck and date always produce the same bytes.
    pub fn render(&self, deck: &Deck) -> Result<Vec<u8>> {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        let plans = plan_deck(deck, date)?;
        log::debug!("Rendering '{}' as {} slides", deck.title, plans.len());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        part(&mut zip, options, "[Content_Types].xml", &content_types_xml(&plans))?;
        part(&mut zip, options, "_rels/.rels", &root_rels_xml())?;
        part(&mut zip, options, "docProps/app.xml", &app_xml(&plans))?;
        part(
            &mut zip,
            options,
            "docProps/core.xml",
            &core_xml(&deck.title, &self.author, date),
        )?;
        part(&mut zip, options, "ppt/presentation.xml", &presentation_xml(&plans))?;
        part(
            &mut zip,
            options,
            "ppt/_rels/presentation.xml.rels",
            &presentation_rels_xml(&plans),
        )?;
        part(&mut zip, options, "ppt/presProps.xml", &pres_props_xml())?;
        part(&mut zip, options, "ppt/viewProps.xml", &view_props_xml())?;
        part(&mut zip, options, "ppt/tableStyles.xml", &table_styles_xml())?;
        part(&mut zip, options, "ppt/theme/theme1.xml", &theme_xml("deckgen"))?;
        part(&mut zip, options, "ppt/theme/theme2.xml", &theme_xml("deckgen notes"))?;
        part(
            &mut zip,
            options,
            "ppt/slideMasters/slideMaster1.xml",
            &slide_master_xml(),
        )?;
        part(
            &mut zip,
            options,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &rels_xml(&[
                (REL_TYPE_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                (REL_TYPE_THEME, "../theme/theme1.xml"),
            ]),
        )?;
        part(
            &mut zip,
            options,
            "ppt/slideLayouts/slideLayout1.xml",
            &slide_layout_xml(),
        )?;
        part(
            &mut zip,
            options,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            &rels_xml(&[(REL_TYPE_SLIDE_MASTER, "../slideMasters/slideMaster1.xml")]),
        )?;
        part(
            &mut zip,
            options,
            "ppt/notesMasters/notesMaster1.xml",
            &notes_master_xml(),
        )?;
        part(
            &mut zip,
            options,
            "ppt/notesMasters/_rels/notesMaster1.xml.rels",
            &rels_xml(&[(REL_TYPE_THEME, "../theme/theme2.xml")]),
        )?;

        for (idx, plan) in plans.iter().enumerate() {
            let num = idx + 1;
            part(
                &mut zip,
                options,
                &format!("ppt/slides/slide{}.xml", num),
                &slide_xml(plan),
            )?;

            let notes_target = format!("../notesSlides/notesSlide{}.xml", num);
            let mut rels = vec![(REL_TYPE_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml")];
            if plan.notes.is_some() {
                rels.push((REL_TYPE_NOTES_SLIDE, notes_target.as_str()));
            }
            part(
                &mut zip,
                options,
                &format!("ppt/slides/_rels/slide{}.xml.rels", num),
                &rels_xml(&rels),
            )?;

            if let Some(notes) = &plan.notes {
                let slide_target = format!("../slides/slide{}.xml", num);
                part(
                    &mut zip,
                    options,
                    &format!("ppt/notesSlides/notesSlide{}.xml", num),
                    &notes_slide_xml(notes),
                )?;
                part(
                    &mut zip,
                    options,
                    &format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", num),
                    &rels_xml(&[
                        (REL_TYPE_NOTES_MASTER, "../notesMasters/notesMaster1.xml"),
                        (REL_TYPE_SLIDE, slide_target.as_str()),
                    ]),
                )?;
            }
        }

        let cursor = zip
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;
        Ok(cursor.into_inner())
    }

    /// Render a deck along with its suggested file name.
    pub fn render_named(&self, deck: &Deck) -> Result<RenderedDeck> {
        Ok(RenderedDeck {
            file_name: file_name_for(&deck.title),
            bytes: self.render(deck)?,
        })
    }
}

/// Write one part into the package.
fn part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    options: FileOptions,
    name: &str,
    content: &str,
) -> Result<()> {
    zip.start_file(name, options)
        .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

/// Escape text for element content, dropping code points XML cannot carry.
fn xml_text(text: &str) -> String {
    let legal = XML_ILLEGAL_REGEX.replace_all(text, "");
    escape(legal.as_ref()).into_owned()
}

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Root attributes shared by PresentationML parts.
fn pml_namespaces() -> String {
    format!(
        r#"xmlns:a="{}" xmlns:r="{}" xmlns:p="{}""#,
        NS_DRAWING, NS_RELATIONSHIPS, NS_PRESENTATION
    )
}

fn rels_xml(rels: &[(&str, &str)]) -> String {
    let mut xml = format!(
        "{}\n<Relationships xmlns=\"{}\">\n",
        XML_HEADER, NS_PACKAGE_RELATIONSHIPS
    );
    for (idx, (rel_type, target)) in rels.iter().enumerate() {
        xml.push_str(&format!(
            "  <Relationship Id=\"rId{}\" Type=\"{}\" Target=\"{}\"/>\n",
            idx + 1,
            rel_type,
            target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn content_types_xml(plans: &[SlidePlan]) -> String {
    const PML: &str = "application/vnd.openxmlformats-officedocument.presentationml";

    let mut xml = format!(
        r#"{header}
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="{pml}.presentation.main+xml"/>
  <Override PartName="/ppt/presProps.xml" ContentType="{pml}.presProps+xml"/>
  <Override PartName="/ppt/viewProps.xml" ContentType="{pml}.viewProps+xml"/>
  <Override PartName="/ppt/tableStyles.xml" ContentType="{pml}.tableStyles+xml"/>
  <Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>
  <Override PartName="/ppt/theme/theme2.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>
  <Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{pml}.slideMaster+xml"/>
  <Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="{pml}.slideLayout+xml"/>
  <Override PartName="/ppt/notesMasters/notesMaster1.xml" ContentType="{pml}.notesMaster+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
  <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
"#,
        header = XML_HEADER,
        pml = PML
    );

    for (idx, plan) in plans.iter().enumerate() {
        xml.push_str(&format!(
            "  <Override PartName=\"/ppt/slides/slide{}.xml\" ContentType=\"{}.slide+xml\"/>\n",
            idx + 1,
            PML
        ));
        if plan.notes.is_some() {
            xml.push_str(&format!(
                "  <Override PartName=\"/ppt/notesSlides/notesSlide{}.xml\" ContentType=\"{}.notesSlide+xml\"/>\n",
                idx + 1,
                PML
            ));
        }
    }

    xml.push_str("</Types>");
    xml
}

fn root_rels_xml() -> String {
    rels_xml(&[
        (
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
            "ppt/presentation.xml",
        ),
        (
            "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
            "docProps/core.xml",
        ),
        (
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties",
            "docProps/app.xml",
        ),
    ])
}

fn app_xml(plans: &[SlidePlan]) -> String {
    let notes = plans.iter().filter(|p| p.notes.is_some()).count();
    format!(
        r#"{}
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
  <TotalTime>0</TotalTime>
  <Application>deckgen</Application>
  <PresentationFormat>Widescreen</PresentationFormat>
  <Slides>{}</Slides>
  <Notes>{}</Notes>
  <HiddenSlides>0</HiddenSlides>
  <ScaleCrop>false</ScaleCrop>
  <LinksUpToDate>false</LinksUpToDate>
  <SharedDoc>false</SharedDoc>
  <HyperlinksChanged>false</HyperlinksChanged>
  <AppVersion>1.0</AppVersion>
</Properties>"#,
        XML_HEADER,
        plans.len(),
        notes
    )
}

fn core_xml(title: &str, author: &str, date: NaiveDate) -> String {
    let stamp = date.format("%Y-%m-%dT00:00:00Z");
    format!(
        r#"{}
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>{}</dc:title>
  <dc:subject>{}</dc:subject>
  <dc:creator>{}</dc:creator>
  <cp:lastModifiedBy>{}</cp:lastModifiedBy>
  <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
  <dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>
</cp:coreProperties>"#,
        XML_HEADER,
        xml_text(title),
        xml_text(title),
        xml_text(author),
        xml_text(author),
        stamp,
        stamp
    )
}

fn presentation_xml(plans: &[SlidePlan]) -> String {
    let mut slide_ids = String::new();
    for idx in 0..plans.len() {
        slide_ids.push_str(&format!(
            "    <p:sldId id=\"{}\" r:id=\"rId{}\"/>\n",
            256 + idx,
            FIRST_SLIDE_REL_ID + idx
        ));
    }

    format!(
        r#"{}
<p:presentation {} saveSubsetFonts="1">
  <p:sldMasterIdLst>
    <p:sldMasterId id="2147483648" r:id="rId1"/>
  </p:sldMasterIdLst>
  <p:notesMasterIdLst>
    <p:notesMasterId r:id="rId2"/>
  </p:notesMasterIdLst>
  <p:sldIdLst>
{}  </p:sldIdLst>
  <p:sldSz cx="{}" cy="{}"/>
  <p:notesSz cx="{}" cy="{}"/>
</p:presentation>"#,
        XML_HEADER,
        pml_namespaces(),
        slide_ids,
        SLIDE_WIDTH_EMU,
        SLIDE_HEIGHT_EMU,
        NOTES_WIDTH_EMU,
        NOTES_HEIGHT_EMU
    )
}

fn presentation_rels_xml(plans: &[SlidePlan]) -> String {
    let slide_targets: Vec<String> = (1..=plans.len())
        .map(|num| format!("slides/slide{}.xml", num))
        .collect();

    let mut rels = vec![
        (REL_TYPE_SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
        (REL_TYPE_NOTES_MASTER, "notesMasters/notesMaster1.xml"),
        (
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps",
            "presProps.xml",
        ),
        (
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps",
            "viewProps.xml",
        ),
        (REL_TYPE_THEME, "theme/theme1.xml"),
        (
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles",
            "tableStyles.xml",
        ),
    ];
    debug_assert_eq!(rels.len() + 1, FIRST_SLIDE_REL_ID);

    rels.extend(
        slide_targets
            .iter()
            .map(|target| (REL_TYPE_SLIDE, target.as_str())),
    );
    rels_xml(&rels)
}

fn pres_props_xml() -> String {
    format!(
        "{}\n<p:presentationPr {}/>",
        XML_HEADER,
        pml_namespaces()
    )
}

fn view_props_xml() -> String {
    format!(
        r#"{}
<p:viewPr {}>
  <p:normalViewPr>
    <p:restoredLeft sz="15620"/>
    <p:restoredTop sz="94660"/>
  </p:normalViewPr>
  <p:gridSpacing cx="76200" cy="76200"/>
</p:viewPr>"#,
        XML_HEADER,
        pml_namespaces()
    )
}

fn table_styles_xml() -> String {
    format!(
        r#"{}
<a:tblStyleLst xmlns:a="{}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#,
        XML_HEADER, NS_DRAWING
    )
}

fn theme_xml(name: &str) -> String {
    format!(
        r#"{}
<a:theme xmlns:a="{}" name="{}">
  <a:themeElements>
    <a:clrScheme name="deckgen">
      <a:dk1><a:srgbClr val="1F2937"/></a:dk1>
      <a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>
      <a:dk2><a:srgbClr val="4B5563"/></a:dk2>
      <a:lt2><a:srgbClr val="E5E7EB"/></a:lt2>
      <a:accent1><a:srgbClr val="4B5563"/></a:accent1>
      <a:accent2><a:srgbClr val="6B7280"/></a:accent2>
      <a:accent3><a:srgbClr val="9CA3AF"/></a:accent3>
      <a:accent4><a:srgbClr val="374151"/></a:accent4>
      <a:accent5><a:srgbClr val="D1D5DB"/></a:accent5>
      <a:accent6><a:srgbClr val="111827"/></a:accent6>
      <a:hlink><a:srgbClr val="2563EB"/></a:hlink>
      <a:folHlink><a:srgbClr val="7C3AED"/></a:folHlink>
    </a:clrScheme>
    <a:fontScheme name="deckgen">
      <a:majorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>
      <a:minorFont><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>
    </a:fontScheme>
    <a:fmtScheme name="deckgen">
      <a:fillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:fillStyleLst>
      <a:lnStyleLst>
        <a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
      </a:lnStyleLst>
      <a:effectStyleLst>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
        <a:effectStyle><a:effectLst/></a:effectStyle>
      </a:effectStyleLst>
      <a:bgFillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
      </a:bgFillStyleLst>
    </a:fmtScheme>
  </a:themeElements>
</a:theme>"#,
        XML_HEADER,
        NS_DRAWING,
        xml_text(name),
        font = FONT_FACE
    )
}

/// Empty shape tree header shared by every slide-like part.
const SP_TREE_HEADER: &str = r#"      <p:nvGrpSpPr>
        <p:cNvPr id="1" name=""/>
        <p:cNvGrpSpPr/>
        <p:nvPr/>
      </p:nvGrpSpPr>
      <p:grpSpPr/>
"#;

const CLR_MAP: &str = r#"bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink""#;

fn slide_master_xml() -> String {
    format!(
        r#"{}
<p:sldMaster {}>
  <p:cSld>
    <p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>
    <p:spTree>
{}    </p:spTree>
  </p:cSld>
  <p:clrMap {}/>
  <p:sldLayoutIdLst>
    <p:sldLayoutId id="2147483649" r:id="rId1"/>
  </p:sldLayoutIdLst>
</p:sldMaster>"#,
        XML_HEADER,
        pml_namespaces(),
        SP_TREE_HEADER,
        CLR_MAP
    )
}

fn slide_layout_xml() -> String {
    format!(
        r#"{}
<p:sldLayout {} type="blank" preserve="1">
  <p:cSld name="Blank">
    <p:spTree>
{}    </p:spTree>
  </p:cSld>
  <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#,
        XML_HEADER,
        pml_namespaces(),
        SP_TREE_HEADER
    )
}

fn notes_master_xml() -> String {
    format!(
        r#"{}
<p:notesMaster {}>
  <p:cSld>
    <p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>
    <p:spTree>
{}    </p:spTree>
  </p:cSld>
  <p:clrMap {}/>
</p:notesMaster>"#,
        XML_HEADER,
        pml_namespaces(),
        SP_TREE_HEADER,
        CLR_MAP
    )
}

fn slide_xml(plan: &SlidePlan) -> String {
    let mut shapes = String::new();
    for (idx, shape) in plan.shapes.iter().enumerate() {
        // id 1 is the group shape.
        let id = idx + 2;
        match shape {
            Shape::Text(block) => shapes.push_str(&text_shape_xml(id, block)),
            Shape::Rect { name, frame, fill } => {
                let (x, y, cx, cy) = frame.to_emu();
                shapes.push_str(&format!(
                    r#"      <p:sp>
        <p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>
        <p:spPr>
          <a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>
          <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
          <a:solidFill><a:srgbClr val="{}"/></a:solidFill>
          <a:ln><a:noFill/></a:ln>
        </p:spPr>
      </p:sp>
"#,
                    id, name, x, y, cx, cy, fill
                ));
            }
        }
    }

    format!(
        r#"{}
<p:sld {}>
  <p:cSld>
    <p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>
    <p:spTree>
{}{}    </p:spTree>
  </p:cSld>
  <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sld>"#,
        XML_HEADER,
        pml_namespaces(),
        plan.background,
        SP_TREE_HEADER,
        shapes
    )
}

fn text_shape_xml(id: usize, block: &TextBlock) -> String {
    let (x, y, cx, cy) = block.frame.to_emu();
    let style = &block.style;
    let size = style.size_pt * 100;
    let bold = if style.bold { " b=\"1\"" } else { "" };

    let mut paragraphs = String::new();
    for text in &block.paragraphs {
        if text.is_empty() {
            paragraphs.push_str(&format!(
                "          <a:p><a:pPr algn=\"{}\"/><a:endParaRPr lang=\"en-US\" sz=\"{}\"/></a:p>\n",
                style.align.as_ooxml(),
                size
            ));
            continue;
        }
        paragraphs.push_str(&format!(
            r#"          <a:p>
            <a:pPr algn="{}"/>
            <a:r>
              <a:rPr lang="en-US" sz="{}"{} dirty="0"><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:latin typeface="{}"/></a:rPr>
              <a:t>{}</a:t>
            </a:r>
          </a:p>
"#,
            style.align.as_ooxml(),
            size,
            bold,
            style.color,
            FONT_FACE,
            xml_text(text)
        ));
    }

    format!(
        r#"      <p:sp>
        <p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>
        <p:spPr>
          <a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>
          <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
          <a:noFill/>
        </p:spPr>
        <p:txBody>
          <a:bodyPr wrap="square" anchor="{}"><a:normAutofit/></a:bodyPr>
          <a:lstStyle/>
{}        </p:txBody>
      </p:sp>
"#,
        id,
        block.name,
        x,
        y,
        cx,
        cy,
        style.anchor.as_ooxml(),
        paragraphs
    )
}

fn notes_slide_xml(notes: &str) -> String {
    let mut paragraphs = String::new();
    for line in notes.lines() {
        paragraphs.push_str(&format!(
            "          <a:p><a:r><a:rPr lang=\"en-US\" dirty=\"0\"/><a:t>{}</a:t></a:r></a:p>\n",
            xml_text(line)
        ));
    }

    format!(
        r#"{}
<p:notes {}>
  <p:cSld>
    <p:spTree>
{}      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="2" name="Slide Image Placeholder 1"/>
          <p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr>
          <p:nvPr><p:ph type="sldImg"/></p:nvPr>
        </p:nvSpPr>
        <p:spPr/>
      </p:sp>
      <p:sp>
        <p:nvSpPr>
          <p:cNvPr id="3" name="Notes Placeholder 2"/>
          <p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>
          <p:nvPr><p:ph type="body" idx="1"/></p:nvPr>
        </p:nvSpPr>
        <p:spPr/>
        <p:txBody>
          <a:bodyPr/>
          <a:lstStyle/>
{}        </p:txBody>
      </p:sp>
    </p:spTree>
  </p:cSld>
  <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:notes>"#,
        XML_HEADER,
        pml_namespaces(),
        SP_TREE_HEADER,
        paragraphs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::Slide;
    use std::io::Read;
    use zip::ZipArchive;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn deck() -> Deck {
        Deck {
            title: "R&D <Review>".to_string(),
            subtitle: None,
            slides: vec![
                Slide::new("Goals", vec!["Ship v2".to_string()]),
                Slide::new("Risks", vec!["Hiring".to_string()]).with_notes("Keep it short"),
            ],
        }
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_file_name_for() {
        assert_eq!(file_name_for("Q3 Plan!"), "Q3_Plan_.pptx");
        assert_eq!(file_name_for("Pitch: AI/ML 2026"), "Pitch__AI_ML_2026.pptx");
        assert_eq!(file_name_for("Plain"), "Plain.pptx");
    }

    #[test]
    fn test_render_named() {
        let rendered = PptxRenderer::new().with_date(date()).render_named(&deck()).unwrap();
        assert_eq!(rendered.file_name, "R_D__Review_.pptx");
        assert!(rendered.bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_package_contains_all_slides() {
        let bytes = PptxRenderer::new().with_date(date()).render(&deck()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();

        for name in [
            "[Content_Types].xml",
            "ppt/presentation.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/slide3.xml",
            "ppt/notesSlides/notesSlide3.xml",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {}", name);
        }
        assert!(archive.by_name("ppt/slides/slide4.xml").is_err());
        assert!(archive.by_name("ppt/notesSlides/notesSlide2.xml").is_err());

        let presentation = read_part(&bytes, "ppt/presentation.xml");
        assert_eq!(presentation.matches("<p:sldId ").count(), 3);
    }

    #[test]
    fn test_text_is_escaped() {
        let bytes = PptxRenderer::new().with_date(date()).render(&deck()).unwrap();

        let title_slide = read_part(&bytes, "ppt/slides/slide1.xml");
        assert!(title_slide.contains("R&amp;D &lt;Review&gt;"));
        assert!(title_slide.contains("October 18, 2026"));

        let core = read_part(&bytes, "docProps/core.xml");
        assert!(core.contains("<dc:title>R&amp;D &lt;Review&gt;</dc:title>"));
    }

    #[test]
    fn test_notes_live_in_notes_part_only() {
        let bytes = PptxRenderer::new().with_date(date()).render(&deck()).unwrap();

        assert!(!read_part(&bytes, "ppt/slides/slide3.xml").contains("Keep it short"));
        assert!(read_part(&bytes, "ppt/notesSlides/notesSlide3.xml").contains("Keep it short"));
        assert!(read_part(&bytes, "ppt/slides/_rels/slide3.xml.rels").contains("notesSlide3.xml"));
    }

    fn assert_well_formed_parts(bytes: &[u8]) {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        for idx in 0..archive.len() {
            let mut file = archive.by_index(idx).unwrap();
            let name = file.name().to_string();
            let mut content = String::new();
            file.read_to_string(&mut content).unwrap();

            if let Some(bad) = content
                .chars()
                .find(|c| *c < ' ' && !matches!(*c, '\t' | '\n' | '\r'))
            {
                panic!("{} contains U+{:04X}", name, bad as u32);
            }

            let mut reader = quick_xml::Reader::from_str(&content);
            loop {
                match reader.read_event() {
                    Ok(quick_xml::events::Event::Eof) => break,
                    Ok(_) => {}
                    Err(e) => panic!("{} is not well-formed: {}", name, e),
                }
            }
        }
    }

    #[test]
    fn test_control_characters_are_dropped() {
        let deck = deck_core::ResponseNormalizer::new()
            .normalize("model said \u{1}\u{8} garbage\u{c}page")
            .into_deck()
            .unwrap();
        let bytes = PptxRenderer::new().with_date(date()).render(&deck).unwrap();

        assert_well_formed_parts(&bytes);
        assert!(read_part(&bytes, "ppt/slides/slide2.xml").contains("model said  garbagepage"));
    }

    #[test]
    fn test_control_characters_in_title_and_notes() {
        let deck = Deck {
            title: "Bad\u{0}Title\u{1b}".to_string(),
            subtitle: Some("sub\u{7}".to_string()),
            slides: vec![Slide::new("Notes", vec!["x".to_string()]).with_notes("ping\u{b}pong")],
        };
        let bytes = PptxRenderer::new()
            .with_date(date())
            .with_author("a\u{2}b")
            .render(&deck)
            .unwrap();

        assert_well_formed_parts(&bytes);
        assert!(read_part(&bytes, "docProps/core.xml").contains("<dc:title>BadTitle</dc:title>"));
        assert!(read_part(&bytes, "ppt/notesSlides/notesSlide2.xml").contains("pingpong"));
    }

    #[test]
    fn test_render_is_deterministic_for_fixed_date() {
        let renderer = PptxRenderer::new().with_date(date());
        assert_eq!(renderer.render(&deck()).unwrap(), renderer.render(&deck()).unwrap());
    }

    #[test]
    fn test_render_rejects_deck_without_slides() {
        let mut empty = deck();
        empty.slides.clear();

        assert!(matches!(
            PptxRenderer::new().render(&empty),
            Err(Error::RenderError(_))
        ));
    }
}
