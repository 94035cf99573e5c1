//! Visualization utilities for hybrid_a_star
//!
//! Provides gnuplot plotting of worlds, search candidates and planned
//! paths, plus [`RecordingObserver`], a [`SearchObserver`] that captures a
//! search so it can be rendered afterwards.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Path2D, Point2D, Pose2D};
use crate::path_planning::hybrid_a_star::{Limits, Rectangle, SearchObserver, WorldSnapshot};

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const CYAN: &str = "#00FFFF";
    pub const GRAY: &str = "#808080";
    pub const LIGHT_GRAY: &str = "#C8C8C8";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const START: &str = RED;
    pub const GOAL: &str = GREEN;
    pub const PATH: &str = BLUE;
    pub const CANDIDATE: &str = LIGHT_GRAY;
    pub const VEHICLE: &str = CYAN;
    pub const LIMITS: &str = GRAY;
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: colors::PATH.to_string(),
            line_width: 2.0,
            caption: "Path".to_string(),
        }
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }
}

/// Main visualizer struct
pub struct Visualizer {
    figure: Figure,
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    aspect_ratio: Option<f64>,
    series: usize,
}

impl Visualizer {
    /// Create a new visualizer
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            x_range: None,
            y_range: None,
            aspect_ratio: Some(1.0),
            series: 0,
        }
    }

    /// Set the plot title
    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Set X axis range
    pub fn set_x_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.x_range = Some((min, max));
        self
    }

    /// Set Y axis range
    pub fn set_y_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.y_range = Some((min, max));
        self
    }

    /// Number of plotted series so far
    pub fn series_count(&self) -> usize {
        self.series
    }

    /// Plot a path of poses
    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.plot_path_xy(&path.x_coords(), &path.y_coords(), style)
    }

    /// Plot a pose sequence as a polyline
    pub fn plot_poses(&mut self, poses: &[Pose2D], style: &PathStyle) -> &mut Self {
        let x: Vec<f64> = poses.iter().map(|p| p.x).collect();
        let y: Vec<f64> = poses.iter().map(|p| p.y).collect();
        self.plot_path_xy(&x, &y, style)
    }

    /// Plot a path from x,y vectors
    pub fn plot_path_xy(&mut self, x: &[f64], y: &[f64], style: &PathStyle) -> &mut Self {
        self.figure.axes2d()
            .lines(x, y, &[
                Caption(&style.caption),
                Color(&style.color),
                LineWidth(style.line_width),
            ]);
        self.series += 1;
        self
    }

    /// Plot the outline of an oriented rectangle
    pub fn plot_rectangle(&mut self, rect: &Rectangle, style: &PathStyle) -> &mut Self {
        let vertices = rect.vertices();
        let mut x: Vec<f64> = vertices.iter().map(|v| v.x).collect();
        let mut y: Vec<f64> = vertices.iter().map(|v| v.y).collect();
        x.push(vertices[0].x);
        y.push(vertices[0].y);
        self.plot_path_xy(&x, &y, style)
    }

    /// Plot obstacles
    pub fn plot_obstacles(&mut self, obstacles: &[Rectangle]) -> &mut Self {
        for (i, obstacle) in obstacles.iter().enumerate() {
            let caption = if i == 0 { "Obstacles" } else { "" };
            self.plot_rectangle(obstacle, &PathStyle::new(colors::OBSTACLE, caption));
        }
        self
    }

    /// Plot the search area boundary
    pub fn plot_limits(&mut self, limits: &Limits) -> &mut Self {
        let x = [limits.min_x, limits.max_x, limits.max_x, limits.min_x, limits.min_x];
        let y = [limits.min_y, limits.min_y, limits.max_y, limits.max_y, limits.min_y];
        self.plot_path_xy(&x, &y, &PathStyle::new(colors::LIMITS, "").with_line_width(1.0))
    }

    /// Plot a single point (start, goal, etc.)
    pub fn plot_point(&mut self, point: Point2D, style: &PointStyle) -> &mut Self {
        self.figure.axes2d()
            .points(&[point.x], &[point.y], &[
                Caption(&style.caption),
                Color(&style.color),
                PointSymbol(style.symbol),
                PointSize(style.size),
            ]);
        self.series += 1;
        self
    }

    /// Plot a pose with a heading indicator
    pub fn plot_pose(&mut self, pose: &Pose2D, style: &PointStyle) -> &mut Self {
        self.plot_point(pose.position(), style);

        // Plot direction line (arrow substitute)
        let arrow_len = style.size * 0.5;
        let end_x = pose.x + arrow_len * pose.yaw.cos();
        let end_y = pose.y + arrow_len * pose.yaw.sin();
        self.plot_path_xy(
            &[pose.x, end_x],
            &[pose.y, end_y],
            &PathStyle::new(&style.color, ""),
        )
    }

    /// Plot start pose
    pub fn plot_start(&mut self, pose: &Pose2D) -> &mut Self {
        self.plot_pose(pose, &PointStyle::new(colors::START, "Start").with_size(1.5))
    }

    /// Plot goal pose
    pub fn plot_goal(&mut self, pose: &Pose2D) -> &mut Self {
        self.plot_pose(pose, &PointStyle::new(colors::GOAL, "Goal").with_size(1.5))
    }

    /// Plot vehicle footprints every `stride` poses along a path
    pub fn plot_footprints(
        &mut self,
        path: &Path2D,
        dimensions: (f64, f64),
        stride: usize,
    ) -> &mut Self {
        let (length, width) = dimensions;
        let stride = stride.max(1);
        for pose in path.poses.iter().step_by(stride) {
            if let Ok(footprint) = Rectangle::new(pose.position(), length, width, pose.yaw) {
                let style = PathStyle::new(colors::VEHICLE, "").with_line_width(1.0);
                self.plot_rectangle(&footprint, &style);
            }
        }
        self
    }

    /// Save plot to PNG file
    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> Result<(), String> {
        self.apply_settings();
        self.figure.save_to_png(path, width, height).map_err(|e| e.to_string())
    }

    /// Save plot to SVG file
    pub fn save_svg(&mut self, path: &str) -> Result<(), String> {
        self.apply_settings();
        self.figure.save_to_svg(path, 800, 600).map_err(|e| e.to_string())
    }

    fn apply_settings(&mut self) {
        let axes = self.figure.axes2d();

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);

        if let Some((min, max)) = self.x_range {
            axes.set_x_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some((min, max)) = self.y_range {
            axes.set_y_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned copy of a [`WorldSnapshot`]
#[derive(Debug, Clone)]
pub struct RecordedWorld {
    pub limits: Limits,
    pub start: Pose2D,
    pub goal: Pose2D,
    pub obstacles: Vec<Rectangle>,
    pub vehicle_dimensions: (f64, f64),
}

/// Search observer that records everything it is told for later rendering
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    world: Option<RecordedWorld>,
    candidates: Vec<Vec<Pose2D>>,
    candidate_limit: Option<usize>,
    path: Option<Path2D>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` candidate segments
    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = Some(limit);
        self
    }

    pub fn world(&self) -> Option<&RecordedWorld> {
        self.world.as_ref()
    }

    pub fn candidates(&self) -> &[Vec<Pose2D>] {
        &self.candidates
    }

    pub fn path(&self) -> Option<&Path2D> {
        self.path.as_ref()
    }

    /// Draw the recorded world, candidates and path
    pub fn render(&self, title: &str) -> Visualizer {
        let mut vis = Visualizer::new();
        vis.set_title(title);

        if let Some(world) = &self.world {
            vis.set_x_range(world.limits.min_x, world.limits.max_x);
            vis.set_y_range(world.limits.min_y, world.limits.max_y);
            vis.plot_limits(&world.limits);
            vis.plot_obstacles(&world.obstacles);
        }
        for candidate in &self.candidates {
            vis.plot_poses(candidate, &PathStyle::new(colors::CANDIDATE, "").with_line_width(0.5));
        }
        if let Some(path) = &self.path {
            if let Some(world) = &self.world {
                vis.plot_footprints(path, world.vehicle_dimensions, 10);
            }
            vis.plot_path(path, &PathStyle::default());
        }
        if let Some(world) = &self.world {
            vis.plot_start(&world.start);
            vis.plot_goal(&world.goal);
        }
        vis
    }
}

impl SearchObserver for RecordingObserver {
    fn on_world(&mut self, snapshot: &WorldSnapshot<'_>) {
        self.world = Some(RecordedWorld {
            limits: snapshot.limits,
            start: snapshot.start,
            goal: snapshot.goal,
            obstacles: snapshot.obstacles.to_vec(),
            vehicle_dimensions: snapshot.vehicle_dimensions,
        });
    }

    fn on_candidate(&mut self, poses: &[Pose2D]) {
        if self.candidate_limit.map_or(true, |limit| self.candidates.len() < limit) {
            self.candidates.push(poses.to_vec());
        }
    }

    fn on_path(&mut self, path: &Path2D) {
        self.path = Some(path.clone());
    }
}
