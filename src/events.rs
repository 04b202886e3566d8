use crate::engine::Point;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Show,
    Hide,
    Toggle,
    CursorMove(Point),
    ConfigReload,
}
