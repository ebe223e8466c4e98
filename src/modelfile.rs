//! Model-file parser: a hand-written scanner over the text grammar in §6,
//! no parser-combinator crate — the grammar is five fixed lines followed by
//! a stream of parenthesized triples, which a small state machine reads
//! more directly than a combinator library would.

use crate::camera::Camera;
use crate::error::MlError;
use crate::scene::Scene;
use crate::triangle::Triangle;
use crate::vector::Vec3;

const HEADER_PREFIX: &str = "#MiniLight";
const MIN_DIM: u32 = 1;
const MAX_DIM: u32 = crate::image::IMAGE_DIM_MAX;

/// A fully parsed and validated model file: iteration target, output
/// dimensions, camera, and scene, ready to render.
pub struct ModelData {
    pub iterations: u32,
    pub width: u32,
    pub height: u32,
    pub camera: Camera,
    pub scene: Scene,
}

/// Parses `text` per §6's grammar. Returns `MlError::InvalidModel` naming
/// the 1-based non-blank line at which parsing failed.
pub fn parse(text: &str) -> Result<ModelData, MlError> {
    let mut lines = NonBlankLines::new(text);

    let (header_line, header) = lines.next_or_err("missing #MiniLight header")?;
    if !header.starts_with(HEADER_PREFIX) {
        return Err(invalid(header_line, "first non-blank line must start with #MiniLight"));
    }

    let (iter_line, iter_text) = lines.next_or_err("missing iteration count")?;
    let iterations: i64 = iter_text
        .trim()
        .parse()
        .map_err(|_| invalid(iter_line, "iteration count must be an integer"))?;
    if iterations <= 0 {
        return Err(invalid(iter_line, "iteration count must be positive"));
    }
    if iterations > u32::MAX as i64 {
        return Err(invalid(iter_line, "iteration count is too large"));
    }

    let (dim_line, dim_text) = lines.next_or_err("missing W H dimensions")?;
    let mut dims = dim_text.split_whitespace();
    let w: i64 = dims
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| invalid(dim_line, "expected integer width"))?;
    let h: i64 = dims
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| invalid(dim_line, "expected integer height"))?;
    let width = w.clamp(MIN_DIM as i64, MAX_DIM as i64) as u32;
    let height = h.clamp(MIN_DIM as i64, MAX_DIM as i64) as u32;

    let (cam_line, cam_text) = lines.next_or_err("missing camera line")?;
    let cam_groups = extract_groups(cam_text);
    if cam_groups.len() < 2 {
        return Err(invalid(cam_line, "expected position and direction vectors"));
    }
    let angle = trailing_number(cam_text)
        .ok_or_else(|| invalid(cam_line, "expected a trailing view angle in degrees"))?;
    let camera_position = cam_groups[0];
    let camera_direction = cam_groups[1];

    let (sky_line, sky_text) = lines.next_or_err("missing sky/ground line")?;
    let sky_groups = extract_groups(sky_text);
    if sky_groups.len() < 2 {
        return Err(invalid(sky_line, "expected sky emission and ground reflection vectors"));
    }
    let sky_emission = sky_groups[0];
    let ground_reflection = sky_groups[1];

    let remainder = lines.remainder();
    let triples = extract_groups(remainder);
    let triangles = triples
        .chunks_exact(5)
        .map(|g| Triangle::new(g[0], g[1], g[2], g[3], g[4]))
        .collect();

    let camera = Camera::new(camera_position, camera_direction, angle);
    let scene = Scene::new(triangles, sky_emission, ground_reflection, camera_position);

    Ok(ModelData {
        iterations: iterations as u32,
        width,
        height,
        camera,
        scene,
    })
}

fn invalid(line: usize, reason: &str) -> MlError {
    MlError::InvalidModel {
        line,
        reason: reason.to_string(),
    }
}

/// Extracts every `( x y z )` group in `s` as a [`Vec3`]; groups that don't
/// contain exactly three whitespace-separated floats are skipped rather
/// than failing the whole scan, matching the reference scanner's
/// left-to-right, whitespace-insensitive reading of groups (§6).
fn extract_groups(s: &str) -> Vec<Vec3> {
    let mut out = Vec::new();
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'(' {
            if let Some(rel_close) = s[i + 1..].find(')') {
                let inner = &s[i + 1..i + 1 + rel_close];
                let nums: Vec<f64> = inner
                    .split_whitespace()
                    .filter_map(|t| t.trim_matches(',').parse::<f64>().ok())
                    .collect();
                if nums.len() == 3 {
                    out.push(Vec3::new(nums[0], nums[1], nums[2]));
                }
                i = i + 1 + rel_close + 1;
                continue;
            } else {
                break;
            }
        }
        i += 1;
    }
    out
}

/// The first whitespace-separated token after the last `)` in `s`, parsed
/// as a float — used for the camera line's trailing angle.
fn trailing_number(s: &str) -> Option<f64> {
    let last_close = s.rfind(')')?;
    s[last_close + 1..].split_whitespace().next()?.parse().ok()
}

/// Iterates the non-blank lines of a model file, tracking 1-based line
/// numbers for error reporting, and exposes the untouched remainder of the
/// text once the five fixed lines have been consumed.
struct NonBlankLines<'a> {
    text: &'a str,
    byte_offset: usize,
    line_number: usize,
}

impl<'a> NonBlankLines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte_offset: 0,
            line_number: 0,
        }
    }

    fn next_or_err(&mut self, reason: &str) -> Result<(usize, &'a str), MlError> {
        loop {
            if self.byte_offset >= self.text.len() {
                return Err(invalid(self.line_number + 1, reason));
            }
            let rest = &self.text[self.byte_offset..];
            let (line, consumed) = match rest.find('\n') {
                Some(nl) => (&rest[..nl], nl + 1),
                None => (rest, rest.len()),
            };
            self.byte_offset += consumed;
            self.line_number += 1;
            if !line.trim().is_empty() {
                return Ok((self.line_number, line));
            }
        }
    }

    fn remainder(&self) -> &'a str {
        &self.text[self.byte_offset.min(self.text.len())..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "\
#MiniLight

10

3 2

(0 0 5) (0 0 -1) 45

(1 1 1) (0.2 0.2 0.2)

(-1 0 -1) (1 0 -1) (0 0 1) (0.7 0.7 0.7) (0 0 0)
";

    #[test]
    fn parses_a_well_formed_model_file() {
        let data = parse(VALID).unwrap();
        assert_eq!(data.iterations, 10);
        assert_eq!(data.width, 3);
        assert_eq!(data.height, 2);
        assert_eq!(data.scene.triangle_count(), 1);
    }

    #[test]
    fn missing_header_is_rejected() {
        let text = "not a header\n10\n3 2\n(0 0 0) (0 0 -1) 45\n(1 1 1) (0 0 0)\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, MlError::InvalidModel { line: 1, .. }));
    }

    #[test]
    fn non_positive_iteration_count_is_rejected() {
        let text = "#MiniLight\n0\n3 2\n(0 0 0) (0 0 -1) 45\n(1 1 1) (0 0 0)\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, MlError::InvalidModel { line: 2, .. }));
    }

    #[test]
    fn dimensions_are_clamped_rather_than_rejected() {
        let text = "#MiniLight\n10\n0 999999\n(0 0 0) (0 0 -1) 45\n(1 1 1) (0 0 0)\n";
        let data = parse(text).unwrap();
        assert_eq!(data.width, 1);
        assert_eq!(data.height, crate::image::IMAGE_DIM_MAX);
    }

    #[test]
    fn negative_dimensions_are_clamped_rather_than_rejected() {
        let text = "#MiniLight\n10\n-5 -100\n(0 0 0) (0 0 -1) 45\n(1 1 1) (0 0 0)\n";
        let data = parse(text).unwrap();
        assert_eq!(data.width, 1);
        assert_eq!(data.height, 1);
    }

    #[test]
    fn overlarge_iteration_count_is_rejected() {
        let text = "#MiniLight\n99999999999\n3 2\n(0 0 0) (0 0 -1) 45\n(1 1 1) (0 0 0)\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, MlError::InvalidModel { line: 2, .. }));
    }

    #[test]
    fn extra_whitespace_and_blank_lines_are_tolerated() {
        let text = "\n\n  #MiniLight extra text\n\n\n  5  \n\n 4   4 \n\n ( 0 0 0 )  ( 0 0 -1 )   30 \n\n(0.1 0.1 0.1) (0 0 0)\n";
        let data = parse(text).unwrap();
        assert_eq!(data.iterations, 5);
        assert_eq!(data.width, 4);
    }

    #[test]
    fn trailing_partial_triangle_data_is_simply_dropped() {
        let text = "#MiniLight\n1\n2 2\n(0 0 0) (0 0 -1) 45\n(1 1 1) (0 0 0)\n(-1 0 -1) (1 0 -1)\n";
        let data = parse(text).unwrap();
        assert_eq!(data.scene.triangle_count(), 0);
    }
}
