//! 应用状态
//!
//! 所有会话状态集中在 `AppState` 中，只能通过 `apply` 进行转换

use medscan_core::{AppView, PatientDetails, Result, Theme, User};
use serde::Serialize;
use tracing::debug;

use crate::registry::PatientRegistry;
use crate::state_machine::{ViewEvent, ViewStateMachine};

/// 状态转换事件
#[derive(Debug, Clone)]
pub enum AppEvent {
    Navigate(AppView),
    LoggedIn(User),
    LoggedOut,
    ToggleTheme,
}

/// 单个浏览器会话的应用状态
#[derive(Debug, Clone)]
pub struct AppState {
    pub view: AppView,
    pub user: Option<User>,
    pub theme: Theme,
    pub patient: PatientDetails,
    pub registry: PatientRegistry,
}

/// 会话概要（不含登记表）
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub view: AppView,
    pub user: Option<User>,
    pub theme: Theme,
    pub records: usize,
}

impl AppState {
    /// 新会话从 LANDING 开始，未登录
    pub fn new() -> Self {
        Self {
            view: AppView::Landing,
            user: None,
            theme: Theme::default(),
            patient: PatientDetails::blank(),
            registry: PatientRegistry::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// 执行一次状态转换
    pub fn apply(self, machine: &ViewStateMachine, event: AppEvent) -> Result<Self> {
        let from = self.view;
        let next = match event {
            AppEvent::Navigate(view) => {
                let to = machine.transition(
                    from,
                    ViewEvent::navigate_to(view),
                    self.is_authenticated(),
                )?;
                Self { view: to, ..self }
            }
            AppEvent::LoggedIn(user) => {
                let to = machine.transition(from, ViewEvent::LoginSucceeded, true)?;
                Self {
                    view: to,
                    user: Some(user),
                    ..self
                }
            }
            AppEvent::LoggedOut => {
                let to = machine.transition(from, ViewEvent::LoggedOut, false)?;
                Self {
                    view: to,
                    user: None,
                    ..self
                }
            }
            AppEvent::ToggleTheme => Self {
                theme: self.theme.toggled(),
                ..self
            },
        };

        debug!("View transition: {:?} -> {:?}", from, next.view);
        Ok(next)
    }

    /// 就地执行状态转换，失败时状态保持不变
    pub fn dispatch(&mut self, machine: &ViewStateMachine, event: AppEvent) -> Result<()> {
        *self = self.clone().apply(machine, event)?;
        Ok(())
    }

    /// 替换患者草稿
    pub fn update_patient(&mut self, patient: PatientDetails) {
        self.patient = patient;
    }

    /// 重置患者草稿，生成新编号
    pub fn reset_patient(&mut self) -> &PatientDetails {
        self.patient = PatientDetails::blank();
        &self.patient
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            view: self.view,
            user: self.user.clone(),
            theme: self.theme,
            records: self.registry.len(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
