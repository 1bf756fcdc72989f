use chrono::Local;
use iced::widget::canvas::Canvas;
use iced::widget::mouse_area;
use iced::widget::{
    button, column, container, pick_list, row, rule, scrollable, space, text, text_input,
};
use iced::{Center, Element, Fill, Padding, Subscription, Task, window};
use rusqlite::Connection;

use crate::auth::{self, AuthenticatedUser};
use crate::config::Config;
use crate::db;
use crate::error::{Error, Field, ValidationErrors};
use crate::form::StudyLogForm;
use crate::milestone::Milestone;
use crate::models::{StudyMaterial, Subject};
use crate::notifications;
use crate::quest::{self, RecordView};
use crate::stats::StatsView;
use crate::widgets::{BarChart, GoalChart, LineChart, ProgressBarWidget};
use crate::xp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Record,
    Stats,
}

#[derive(Debug, Clone)]
pub enum Message {
    SwitchView(View),
    LoginNameChanged(String),
    Login,
    Logout,
    SubjectSelected(Subject),
    MaterialSelected(StudyMaterial),
    VideoCountChanged(String),
    SolveCountChanged(String),
    MinutesChanged(String),
    Submit,
    DismissMilestones,
    Minimize,
    Close,
    WindowReady(window::Id),
    DragStart,
}

pub struct App {
    config: Config,
    db: Option<Connection>,
    user: Option<AuthenticatedUser>,
    current_view: View,
    login_name: String,
    login_error: Option<String>,
    subjects: Vec<Subject>,
    selected_subject: Option<Subject>,
    selected_material: Option<StudyMaterial>,
    video_input: String,
    solve_input: String,
    minutes_input: String,
    form_errors: ValidationErrors,
    record: Option<RecordView>,
    stats: Option<StatsView>,
    milestones: Vec<Milestone>,
    last_gain: Option<u64>,
    status: Option<String>,
    window_id: Option<window::Id>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let db_path = config.database_path();
        let (db, status) = match db::init_db(&db_path) {
            Ok(conn) => (Some(conn), None),
            Err(e) => {
                tracing::error!(error = %e, path = %db_path.display(), "failed to open database");
                (None, Some(format!("Could not open {}: {}", db_path.display(), e)))
            }
        };

        let mut app = App {
            login_name: config.user.clone().unwrap_or_default(),
            config,
            db,
            user: None,
            current_view: View::Login,
            login_error: None,
            subjects: Vec::new(),
            selected_subject: None,
            selected_material: None,
            video_input: String::new(),
            solve_input: String::new(),
            minutes_input: String::new(),
            form_errors: ValidationErrors::default(),
            record: None,
            stats: None,
            milestones: Vec::new(),
            last_gain: None,
            status,
            window_id: None,
        };

        if !app.login_name.is_empty() {
            try_login(&mut app);
            // a stale configured name is not worth an error on start
            app.login_error = None;
        }
        app
    }
}

pub fn update(app: &mut App, message: Message) -> Task<Message> {
    match message {
        Message::SwitchView(v) => {
            if auth::require(app.user.as_ref()).is_err() {
                app.current_view = View::Login;
                return Task::none();
            }
            app.current_view = v;
            refresh(app);
            Task::none()
        }
        Message::LoginNameChanged(name) => {
            app.login_name = name;
            Task::none()
        }
        Message::Login => {
            try_login(app);
            Task::none()
        }
        Message::Logout => {
            app.user = None;
            app.record = None;
            app.stats = None;
            app.current_view = View::Login;
            Task::none()
        }
        Message::SubjectSelected(subject) => {
            app.selected_subject = Some(subject);
            Task::none()
        }
        Message::MaterialSelected(material) => {
            app.selected_material = Some(material);
            Task::none()
        }
        Message::VideoCountChanged(value) => {
            app.video_input = value;
            Task::none()
        }
        Message::SolveCountChanged(value) => {
            app.solve_input = value;
            Task::none()
        }
        Message::MinutesChanged(value) => {
            app.minutes_input = value;
            Task::none()
        }
        Message::Submit => {
            submit(app);
            Task::none()
        }
        Message::DismissMilestones => {
            app.milestones.clear();
            Task::none()
        }
        Message::WindowReady(id) => {
            app.window_id = Some(id);
            Task::none()
        }
        Message::DragStart => {
            if let Some(id) = app.window_id {
                window::drag(id)
            } else {
                Task::none()
            }
        }
        Message::Minimize => {
            if let Some(id) = app.window_id {
                window::minimize(id, true)
            } else {
                Task::none()
            }
        }
        Message::Close => {
            if let Some(id) = app.window_id {
                window::close(id)
            } else {
                Task::none()
            }
        }
    }
}

fn try_login(app: &mut App) {
    let Some(conn) = &app.db else {
        return;
    };
    match auth::login(conn, &app.login_name) {
        Ok(user) => {
            app.user = Some(user);
            app.login_error = None;
            app.current_view = View::Record;
            refresh(app);
        }
        Err(Error::Unauthenticated) => {
            app.login_error = Some(format!("No user named {:?}", app.login_name.trim()));
        }
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            app.login_error = Some(e.to_string());
        }
    }
}

fn submit(app: &mut App) {
    let form = StudyLogForm {
        subject: app
            .selected_subject
            .as_ref()
            .map(|s| s.code.clone())
            .unwrap_or_default(),
        material: app
            .selected_material
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        video_count: app.video_input.clone(),
        solve_count: app.solve_input.clone(),
        minutes: app.minutes_input.clone(),
    };

    let (Some(conn), Ok(user)) = (app.db.as_mut(), auth::require(app.user.as_ref())) else {
        app.current_view = View::Login;
        return;
    };

    match quest::record_study(conn, user, &form, Local::now().naive_local()) {
        Ok(outcome) => {
            if app.config.notifications {
                notifications::deliver(outcome.gained_xp, &outcome.milestones);
            }
            app.form_errors = ValidationErrors::default();
            app.video_input.clear();
            app.solve_input.clear();
            app.minutes_input.clear();
            app.last_gain = Some(outcome.gained_xp);
            app.milestones = outcome.milestones;
            app.status = None;
            refresh(app);
        }
        Err(Error::Validation(errors)) => {
            app.form_errors = errors;
        }
        Err(Error::Unauthenticated) => {
            app.user = None;
            app.current_view = View::Login;
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to record study");
            app.status = Some(format!("Could not save: {}", e));
        }
    }
}

/// reload whatever the current view shows
fn refresh(app: &mut App) {
    let (Some(conn), Some(user)) = (&app.db, &app.user) else {
        return;
    };

    match db::list_subjects(conn) {
        Ok(subjects) => {
            let selected_id = app.selected_subject.as_ref().map(|s| s.id);
            app.selected_subject =
                selected_id.and_then(|id| subjects.iter().find(|s| s.id == id).cloned());
            app.subjects = subjects;
        }
        Err(e) => tracing::warn!(error = %e, "failed to load subjects"),
    }

    let result = match app.current_view {
        View::Record => quest::record_view(conn, user).map(|r| app.record = Some(r)),
        View::Stats => quest::stats_view(conn, user).map(|s| app.stats = Some(s)),
        View::Login => Ok(()),
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to refresh view");
        app.status = Some(e.to_string());
    }
}

pub fn subscription(app: &App) -> Subscription<Message> {
    if app.window_id.is_none() {
        window::open_events().map(Message::WindowReady)
    } else {
        Subscription::none()
    }
}

fn view_titlebar(_app: &App) -> Element<'_, Message> {
    let drag_area = mouse_area(
        space::horizontal()
            .width(iced::Length::Fill)
            .height(iced::Length::Fill),
    )
    .on_press(Message::DragStart);

    let minimize = mouse_area(text("─").size(20)).on_press(Message::Minimize);

    let close = mouse_area(text("✕").size(18)).on_press(Message::Close);

    row![
        drag_area,
        minimize,
        space::horizontal().width(iced::Length::Fixed(12.0)),
        close,
    ]
    .align_y(Center)
    .padding(Padding::from([0u16, 8]))
    .height(40)
    .into()
}

pub fn view(app: &App) -> Element<'_, Message> {
    let titlebar = view_titlebar(app);

    let content: Element<Message> = match app.current_view {
        View::Login => view_login(app),
        View::Record => view_record(app),
        View::Stats => view_stats(app),
    };

    let mut layout = column![titlebar].spacing(0).width(Fill).height(Fill);
    if let Some(status) = &app.status {
        layout = layout.push(text(status.clone()).size(12));
    }
    layout = layout.push(scrollable(content).height(Fill));
    if app.current_view != View::Login {
        layout = layout.push(space::vertical().height(8)).push(view_nav(app));
        layout = layout.push(space::vertical().height(8));
    }

    let main_view = container(layout.padding(Padding::from([0u16, 24])))
        .width(Fill)
        .height(Fill);

    if app.milestones.is_empty() {
        return main_view.into();
    }

    let mut modal = column![].align_x(Center).spacing(0).padding(32);
    for milestone in &app.milestones {
        modal = modal
            .push(text(milestone.title()).size(24))
            .push(space::vertical().height(8))
            .push(text(milestone.body()).size(14))
            .push(space::vertical().height(20));
    }
    modal = modal.push(
        button(text("Continue").size(16))
            .on_press(Message::DismissMilestones)
            .padding([12, 24])
            .style(button::primary),
    );

    let modal_container = container(modal)
        .width(iced::Length::Fill)
        .center_x(iced::Length::Fill)
        .center_y(iced::Length::Fill);

    column![main_view, modal_container].into()
}

fn view_login(app: &App) -> Element<'_, Message> {
    let mut content = column![
        space::vertical().height(60),
        text("📚 Study Quest").size(28),
        space::vertical().height(24),
        text_input("Username", &app.login_name)
            .on_input(Message::LoginNameChanged)
            .on_submit(Message::Login)
            .padding(10)
            .size(16),
        space::vertical().height(12),
        button(text("Log in").size(16).align_x(Center))
            .on_press(Message::Login)
            .padding([10, 28])
            .style(button::primary),
    ]
    .align_x(Center)
    .width(Fill);

    if let Some(error) = &app.login_error {
        content = content
            .push(space::vertical().height(12))
            .push(text(error.clone()).size(13));
    }
    content.into()
}

fn field_error(errors: &ValidationErrors, field: Field) -> Option<Element<'static, Message>> {
    errors
        .for_field(field)
        .map(|message| text(format!("{} {}", field.label(), message)).size(12).into())
}

fn view_progress_bar(progress: f32, height: f32) -> Element<'static, Message> {
    Canvas::new(ProgressBarWidget {
        progress: progress.clamp(0.0, 1.0),
    })
    .width(Fill)
    .height(height)
    .into()
}

fn view_log_form(app: &App) -> Element<'_, Message> {
    let subject_pick = pick_list(
        app.subjects.as_slice(),
        app.selected_subject.clone(),
        Message::SubjectSelected,
    )
    .placeholder("Subject")
    .width(Fill);

    let material_pick = pick_list(
        StudyMaterial::ALL,
        app.selected_material,
        Message::MaterialSelected,
    )
    .placeholder("Material")
    .width(Fill);

    let counts = row![
        text_input("Videos", &app.video_input)
            .on_input(Message::VideoCountChanged)
            .padding(8)
            .size(14),
        text_input("Problems", &app.solve_input)
            .on_input(Message::SolveCountChanged)
            .padding(8)
            .size(14),
        text_input("Minutes", &app.minutes_input)
            .on_input(Message::MinutesChanged)
            .on_submit(Message::Submit)
            .padding(8)
            .size(14),
    ]
    .spacing(8);

    let mut form = column![row![subject_pick, material_pick].spacing(8), counts].spacing(8);
    for field in [
        Field::Subject,
        Field::Material,
        Field::VideoCount,
        Field::SolveCount,
        Field::Minutes,
    ] {
        if let Some(error) = field_error(&app.form_errors, field) {
            form = form.push(error);
        }
    }

    form = form.push(
        row![
            space::horizontal(),
            button(text("⚔  Log Study").size(16).align_x(Center))
                .on_press(Message::Submit)
                .padding([10, 28])
                .style(button::primary),
            space::horizontal(),
        ]
        .width(Fill),
    );

    if let Some(gain) = app.last_gain {
        form = form.push(text(format!("+{} XP", gain)).size(14));
    }

    form.into()
}

fn view_record(app: &App) -> Element<'_, Message> {
    let Some(record) = &app.record else {
        return text("Loading...").into();
    };

    let header = row![
        text(format!("📚 {}", record.username)).size(20),
        space::horizontal(),
        text(format!("Lv. {}", record.level)).size(18),
    ]
    .width(Fill);

    let xp_line = row![
        text(format!("⭐ {} XP", record.total_xp)).size(14),
        space::horizontal(),
        text(format!("Next level at {} XP", record.next_level_threshold)).size(14),
    ]
    .width(Fill);

    let mut subjects = column![].spacing(10).width(Fill);
    for progress in &record.subjects {
        let marker = if progress.image.is_some() { "👾 " } else { "" };
        subjects = subjects.push(
            column![
                row![
                    text(format!("{}{}", marker, progress.name)).size(14),
                    space::horizontal(),
                    text(format!(
                        "{}/{} videos • {}%",
                        progress.current_video_count,
                        progress.goal_video_count,
                        progress.progress_percent
                    ))
                    .size(12),
                ]
                .width(Fill),
                view_progress_bar(progress.progress_percent as f32 / 100.0, 8.0),
            ]
            .spacing(4),
        );
    }
    if record.subjects.is_empty() {
        subjects = subjects.push(text("No subjects yet. Ask an admin to import some.").size(13));
    }

    column![
        header,
        space::vertical().height(12),
        xp_line,
        space::vertical().height(6),
        view_progress_bar(xp::level_progress(record.total_xp), 12.0),
        space::vertical().height(16),
        view_log_form(app),
        space::vertical().height(16),
        rule::horizontal(1),
        space::vertical().height(12),
        subjects,
    ]
    .spacing(0)
    .width(Fill)
    .into()
}

fn view_stats(app: &App) -> Element<'_, Message> {
    let Some(stats) = &app.stats else {
        return text("Loading...").into();
    };
    let summary = &stats.summary;

    let title = text("📊 Stats & Progress").size(22);

    let totals = column![
        text(format!(
            "Level {} • {} XP (next level at {})",
            summary.level, summary.total_xp, summary.next_level_threshold
        ))
        .size(14),
        text(format!(
            "Problems solved: {} of {} across all subjects",
            summary.total_solved, summary.total_goal_questions
        ))
        .size(14),
    ]
    .spacing(2);

    column![
        title,
        space::vertical().height(12),
        totals,
        space::vertical().height(16),
        rule::horizontal(1),
        space::vertical().height(12),
        text("Problems per day").size(16),
        Canvas::new(BarChart {
            series: stats.daily.solved.clone(),
        })
        .width(Fill)
        .height(140),
        space::vertical().height(12),
        text("Problems solved, cumulative").size(16),
        Canvas::new(LineChart {
            series: stats.daily.cumulative_solved.clone(),
        })
        .width(Fill)
        .height(140),
        space::vertical().height(12),
        text("Problems per subject vs goal").size(16),
        Canvas::new(GoalChart {
            solved: stats.subjects.solved.clone(),
            goals: stats.subjects.goals.clone(),
        })
        .width(Fill)
        .height(160),
    ]
    .spacing(2)
    .width(Fill)
    .into()
}

fn view_nav(app: &App) -> Element<'_, Message> {
    let record_style = if app.current_view == View::Record {
        button::primary
    } else {
        button::secondary
    };
    let stats_style = if app.current_view == View::Stats {
        button::primary
    } else {
        button::secondary
    };

    row![
        button(text("⚔  Record").size(14).align_x(Center))
            .on_press(Message::SwitchView(View::Record))
            .padding([8, 20])
            .width(Fill)
            .style(record_style),
        button(text("📊  Stats").size(14).align_x(Center))
            .on_press(Message::SwitchView(View::Stats))
            .padding([8, 20])
            .width(Fill)
            .style(stats_style),
        button(text("⎋").size(14).align_x(Center))
            .on_press(Message::Logout)
            .padding([8, 12])
            .style(button::secondary),
    ]
    .spacing(8)
    .width(Fill)
    .into()
}
