// -- canvas widgets --

use iced::alignment;
use iced::mouse;
use iced::widget::canvas::{self, Frame, Geometry, Path, Stroke};
use iced::{Color, Point, Size, Theme};

use crate::stats::ChartSeries;

const LABEL_BAND: f32 = 18.0;
const VALUE_BAND: f32 = 14.0;

fn faded(color: Color, a: f32) -> Color {
    Color { a, ..color }
}

/// "2026-02-19" -> "02-19", codes pass through
fn short_label(label: &str) -> String {
    if label.len() == 10 && label.as_bytes()[4] == b'-' {
        label[5..].to_string()
    } else {
        label.to_string()
    }
}

fn small_text(content: String, position: Point, color: Color) -> canvas::Text {
    canvas::Text {
        content,
        position,
        color,
        size: iced::Pixels(10.0),
        align_x: alignment::Horizontal::Center.into(),
        align_y: alignment::Vertical::Center,
        ..canvas::Text::default()
    }
}

fn empty_chart(frame: &mut Frame, bounds: iced::Rectangle, color: Color) {
    frame.fill_text(canvas::Text {
        content: "No study logged yet".to_string(),
        position: Point::new(bounds.width / 2.0, bounds.height / 2.0),
        color: faded(color, 0.5),
        size: iced::Pixels(13.0),
        align_x: alignment::Horizontal::Center.into(),
        align_y: alignment::Vertical::Center,
        ..canvas::Text::default()
    });
}

pub struct ProgressBarWidget {
    pub progress: f32,
}

impl<Message> canvas::Program<Message> for ProgressBarWidget {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        theme: &Theme,
        bounds: iced::Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let palette = theme.palette();

        let bar_height = bounds.height;

        let bg = Path::rectangle(Point::ORIGIN, Size::new(bounds.width, bar_height));
        frame.fill(&bg, faded(palette.text, 0.15));

        let fill_width = bounds.width * self.progress.clamp(0.0, 1.0);
        if fill_width > 0.0 {
            let color = if self.progress >= 1.0 {
                Color::from_rgb(0.4, 0.9, 0.4)
            } else {
                palette.primary
            };
            let fill = Path::rectangle(Point::ORIGIN, Size::new(fill_width, bar_height));
            frame.fill(&fill, color);
        }

        vec![frame.into_geometry()]
    }
}

/// one bar per label
pub struct BarChart {
    pub series: ChartSeries,
}

impl<Message> canvas::Program<Message> for BarChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        theme: &Theme,
        bounds: iced::Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let palette = theme.palette();

        if self.series.is_empty() {
            empty_chart(&mut frame, bounds, palette.text);
            return vec![frame.into_geometry()];
        }

        let max = self.series.max().max(1) as f32;
        let plot_height = bounds.height - LABEL_BAND - VALUE_BAND;
        let slot = bounds.width / self.series.len() as f32;
        let bar_width = (slot * 0.7).max(2.0);

        for (i, (label, value)) in self
            .series
            .labels
            .iter()
            .zip(&self.series.values)
            .enumerate()
        {
            let height = plot_height * (*value as f32 / max);
            let x = i as f32 * slot + (slot - bar_width) / 2.0;
            let y = VALUE_BAND + plot_height - height;
            let bar = Path::rectangle(Point::new(x, y), Size::new(bar_width, height));
            frame.fill(&bar, palette.primary);

            let center = x + bar_width / 2.0;
            if *value > 0 {
                frame.fill_text(small_text(
                    value.to_string(),
                    Point::new(center, y - VALUE_BAND / 2.0),
                    palette.text,
                ));
            }
            frame.fill_text(small_text(
                short_label(label),
                Point::new(center, bounds.height - LABEL_BAND / 2.0),
                faded(palette.text, 0.7),
            ));
        }

        vec![frame.into_geometry()]
    }
}

/// cumulative curve
pub struct LineChart {
    pub series: ChartSeries,
}

impl<Message> canvas::Program<Message> for LineChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        theme: &Theme,
        bounds: iced::Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let palette = theme.palette();

        if self.series.is_empty() {
            empty_chart(&mut frame, bounds, palette.text);
            return vec![frame.into_geometry()];
        }

        let max = self.series.max().max(1) as f32;
        let plot_height = bounds.height - LABEL_BAND - VALUE_BAND;
        let slot = bounds.width / self.series.len() as f32;

        let points: Vec<Point> = self
            .series
            .values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                Point::new(
                    i as f32 * slot + slot / 2.0,
                    VALUE_BAND + plot_height - plot_height * (*value as f32 / max),
                )
            })
            .collect();

        let mut builder = canvas::path::Builder::new();
        for (i, point) in points.iter().enumerate() {
            if i == 0 {
                builder.move_to(*point);
            } else {
                builder.line_to(*point);
            }
        }
        frame.stroke(
            &builder.build(),
            Stroke::default().with_width(2.0).with_color(palette.primary),
        );

        for point in &points {
            frame.fill(&Path::circle(*point, 3.0), palette.primary);
        }

        if let (Some(last), Some(value)) = (points.last(), self.series.values.last()) {
            frame.fill_text(small_text(
                value.to_string(),
                Point::new(last.x, last.y - VALUE_BAND / 2.0 - 2.0),
                palette.text,
            ));
        }
        if let (Some(first), Some(label)) = (points.first(), self.series.labels.first()) {
            frame.fill_text(small_text(
                short_label(label),
                Point::new(first.x, bounds.height - LABEL_BAND / 2.0),
                faded(palette.text, 0.7),
            ));
        }
        if points.len() > 1 {
            if let (Some(last), Some(label)) = (points.last(), self.series.labels.last()) {
                frame.fill_text(small_text(
                    short_label(label),
                    Point::new(last.x, bounds.height - LABEL_BAND / 2.0),
                    faded(palette.text, 0.7),
                ));
            }
        }

        vec![frame.into_geometry()]
    }
}

/// solved vs goal per subject, goal drawn as a faded bar behind
pub struct GoalChart {
    pub solved: ChartSeries,
    pub goals: ChartSeries,
}

impl<Message> canvas::Program<Message> for GoalChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        theme: &Theme,
        bounds: iced::Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let palette = theme.palette();

        if self.goals.is_empty() {
            empty_chart(&mut frame, bounds, palette.text);
            return vec![frame.into_geometry()];
        }

        let max = self.goals.max().max(self.solved.max()).max(1) as f32;
        let plot_height = bounds.height - LABEL_BAND - VALUE_BAND;
        let slot = bounds.width / self.goals.len() as f32;
        let bar_width = (slot * 0.6).max(2.0);

        for (i, label) in self.goals.labels.iter().enumerate() {
            let goal = self.goals.values[i];
            let solved = self.solved.values.get(i).copied().unwrap_or(0);
            let x = i as f32 * slot + (slot - bar_width) / 2.0;
            let base = VALUE_BAND + plot_height;

            let goal_height = plot_height * (goal as f32 / max);
            frame.fill(
                &Path::rectangle(
                    Point::new(x, base - goal_height),
                    Size::new(bar_width, goal_height),
                ),
                faded(palette.text, 0.15),
            );

            let solved_height = plot_height * (solved as f32 / max);
            let color = if goal > 0 && solved >= goal {
                Color::from_rgb(0.4, 0.9, 0.4)
            } else {
                palette.primary
            };
            frame.fill(
                &Path::rectangle(
                    Point::new(x, base - solved_height),
                    Size::new(bar_width, solved_height),
                ),
                color,
            );

            let center = x + bar_width / 2.0;
            frame.fill_text(small_text(
                format!("{}/{}", solved, goal),
                Point::new(center, base - goal_height.max(solved_height) - VALUE_BAND / 2.0),
                palette.text,
            ));
            frame.fill_text(small_text(
                label.clone(),
                Point::new(center, bounds.height - LABEL_BAND / 2.0),
                faded(palette.text, 0.7),
            ));
        }

        vec![frame.into_geometry()]
    }
}
