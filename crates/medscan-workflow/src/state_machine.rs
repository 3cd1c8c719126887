//! 视图状态机
//!
//! 管理 LANDING → LOGIN → DASHBOARD 的视图切换

use medscan_core::{AppView, Result, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 视图切换事件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ViewEvent {
    ShowLanding,
    ShowLogin,
    ShowDashboard,
    LoginSucceeded,
    LoggedOut,
}

impl ViewEvent {
    /// 导航到指定视图对应的事件
    pub fn navigate_to(view: AppView) -> Self {
        match view {
            AppView::Landing => ViewEvent::ShowLanding,
            AppView::Login => ViewEvent::ShowLogin,
            AppView::Dashboard => ViewEvent::ShowDashboard,
        }
    }
}

/// 视图状态机
#[derive(Debug)]
pub struct ViewStateMachine {
    transitions: HashMap<(AppView, ViewEvent), AppView>,
}

impl ViewStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        // 任意视图之间都可以直接导航，DASHBOARD 的登录守卫在 `transition` 中处理
        for from in Self::get_all_views() {
            transitions.insert((from, ViewEvent::ShowLanding), AppView::Landing);
            transitions.insert((from, ViewEvent::ShowLogin), AppView::Login);
            transitions.insert((from, ViewEvent::ShowDashboard), AppView::Dashboard);
            transitions.insert((from, ViewEvent::LoggedOut), AppView::Landing);
        }
        transitions.insert((AppView::Login, ViewEvent::LoginSucceeded), AppView::Dashboard);
        transitions.insert((AppView::Landing, ViewEvent::LoginSucceeded), AppView::Dashboard);

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: AppView, event: ViewEvent) -> bool {
        self.transitions.contains_key(&(from, event))
    }

    /// 执行状态转换
    ///
    /// 未登录时请求 DASHBOARD 会被重定向到 LOGIN。
    pub fn transition(
        &self,
        from: AppView,
        event: ViewEvent,
        authenticated: bool,
    ) -> Result<AppView> {
        match self.transitions.get(&(from, event)) {
            Some(AppView::Dashboard) if !authenticated => Ok(AppView::Login),
            Some(to) => Ok(*to),
            None => Err(ScanError::InvalidStateTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 获取所有视图
    pub fn get_all_views() -> Vec<AppView> {
        vec![AppView::Landing, AppView::Login, AppView::Dashboard]
    }

    /// 获取视图的所有可能事件
    pub fn get_possible_events(&self, current: AppView) -> Vec<ViewEvent> {
        self.transitions
            .keys()
            .filter(|(view, _)| *view == current)
            .map(|(_, event)| *event)
            .collect()
    }
}

impl Default for ViewStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
