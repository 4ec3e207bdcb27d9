//! Plain-text rendering of search outcomes.

use std::fmt::Write as _;

use wayfarer_core::GridPosition;
use wayfarer_system_pathfinding::{Path, SearchOutcome};

const PATH_GLYPH: char = '*';
const START_GLYPH: char = 'S';
const DESTINATION_GLYPH: char = 'D';

/// Describes the outcome as `x,y` steps followed by its cost.
pub(crate) fn describe(outcome: &SearchOutcome, avoidance: bool) -> String {
    let path = match outcome {
        SearchOutcome::Path(path) => path,
        SearchOutcome::NoPathFound => return "no path found\n".to_owned(),
        SearchOutcome::NoSafeCellFound => return "no safe cell found\n".to_owned(),
    };

    let steps = path
        .cells()
        .iter()
        .map(|cell| format!("{},{}", cell.x(), cell.y()))
        .collect::<Vec<_>>()
        .join(" -> ");

    let mut text = String::new();
    let _ = writeln!(text, "path: {steps}");
    let _ = writeln!(text, "steps: {}", path.steps());
    let _ = writeln!(text, "cost: {}", path.cost());
    if avoidance {
        match path.goal_distance() {
            Some(distance) => {
                let _ = writeln!(text, "goal distance: {distance}");
            }
            None => text.push_str("goal distance: unreachable\n"),
        }
    }
    text
}

/// Overlays the path onto the map glyph rows.
pub(crate) fn draw(rows: &[Vec<char>], path: &Path) -> String {
    let mut canvas: Vec<Vec<char>> = rows.to_vec();

    for cell in path.cells() {
        paint(&mut canvas, *cell, PATH_GLYPH);
    }
    if let Some(start) = path.start() {
        paint(&mut canvas, start, START_GLYPH);
    }
    if let Some(destination) = path.destination() {
        paint(&mut canvas, destination, DESTINATION_GLYPH);
    }

    let mut text = String::new();
    for row in canvas {
        text.extend(row);
        text.push('\n');
    }
    text
}

fn paint(canvas: &mut [Vec<char>], cell: GridPosition, glyph: char) {
    let (Ok(x), Ok(y)) = (usize::try_from(cell.x()), usize::try_from(cell.y())) else {
        return;
    };
    if let Some(slot) = canvas.get_mut(y).and_then(|row| row.get_mut(x)) {
        *slot = glyph;
    }
}
