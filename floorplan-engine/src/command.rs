use std::collections::HashMap;

use floorplan_core::model::LevelId;

use crate::scene::Scene;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub scene: &'a mut Scene,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(UndoCommand);
        bus.register(RedoCommand);
        bus.register(ResetCanvasCommand);
        bus.register(AddLevelCommand);
        bus.register(DeleteLevelCommand);
        bus.register(ClearSelectionCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

struct UndoCommand;

impl CommandHandler for UndoCommand {
    fn name(&self) -> &'static str {
        "undo"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if context.scene.undo() {
            CommandResponse::ok("已撤销")
        } else {
            CommandResponse::err("没有可撤销的操作")
        }
    }
}

struct RedoCommand;

impl CommandHandler for RedoCommand {
    fn name(&self) -> &'static str {
        "redo"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if context.scene.redo() {
            CommandResponse::ok("已重做")
        } else {
            CommandResponse::err("没有可重做的操作")
        }
    }
}

struct ResetCanvasCommand;

impl CommandHandler for ResetCanvasCommand {
    fn name(&self) -> &'static str {
        "reset_canvas"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.scene.reset_canvas();
        CommandResponse::ok("当前楼层已重置")
    }
}

struct AddLevelCommand;

impl CommandHandler for AddLevelCommand {
    fn name(&self) -> &'static str {
        "add_level"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let id = context.scene.add_level();
        CommandResponse::ok(format!("已新增楼层 {id}"))
    }
}

/// `delete_level [id]`，省略参数时删除当前楼层。
struct DeleteLevelCommand;

impl CommandHandler for DeleteLevelCommand {
    fn name(&self) -> &'static str {
        "delete_level"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let target = match request.args.first() {
            Some(raw) => match raw.parse::<u32>() {
                Ok(id) => LevelId::new(id),
                Err(_) => return CommandResponse::err(format!("无效的楼层编号: {raw}")),
            },
            None => context.scene.current_level(),
        };
        match context.scene.delete_level(target) {
            Ok(current) => CommandResponse::ok(format!("已删除楼层 {target}，当前楼层 {current}")),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct ClearSelectionCommand;

impl CommandHandler for ClearSelectionCommand {
    fn name(&self) -> &'static str {
        "clear_selection"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.scene.clear_selection();
        CommandResponse::ok("选中已清空")
    }
}
