//! Field-correspondence mapping between the model and the transfer shapes

use crate::dtos::{CommandCreateDto, CommandReadDto, CommandUpdateDto};
use crate::model::Command;

pub fn to_read_dto(cmd: &Command) -> CommandReadDto {
    CommandReadDto {
        id: cmd.id,
        how_to: cmd.how_to.clone(),
        command_line: cmd.command_line.clone(),
        platform: cmd.platform.clone(),
    }
}

pub fn to_read_dtos(cmds: &[Command]) -> Vec<CommandReadDto> {
    cmds.iter().map(to_read_dto).collect()
}

/// New, unsaved command; the id stays unassigned
pub fn from_create_dto(dto: CommandCreateDto) -> Command {
    Command {
        id: 0,
        how_to: dto.how_to,
        command_line: dto.command_line,
        platform: dto.platform,
    }
}

/// Overwrite the text fields of an existing command. The id is untouched.
pub fn apply_update_dto(dto: CommandUpdateDto, cmd: &mut Command) {
    cmd.how_to = dto.how_to;
    cmd.command_line = dto.command_line;
    cmd.platform = dto.platform;
}

/// Patchable view of an existing command
pub fn to_update_dto(cmd: &Command) -> CommandUpdateDto {
    CommandUpdateDto {
        how_to: cmd.how_to.clone(),
        command_line: cmd.command_line.clone(),
        platform: cmd.platform.clone(),
    }
}
