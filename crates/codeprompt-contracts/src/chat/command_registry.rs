#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
    pub key: &'static str,
}

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "tab",
        action: "switch_tab",
        key: "tab",
    },
    CommandSpec {
        command: "target",
        action: "set_target",
        key: "target",
    },
    CommandSpec {
        command: "format",
        action: "set_format",
        key: "format",
    },
    CommandSpec {
        command: "language",
        action: "set_language",
        key: "language",
    },
    CommandSpec {
        command: "video_type",
        action: "set_video_type",
        key: "video_type",
    },
    CommandSpec {
        command: "platform",
        action: "set_platform",
        key: "platform",
    },
    CommandSpec {
        command: "goal",
        action: "set_goal",
        key: "goal",
    },
    CommandSpec {
        command: "username",
        action: "set_username",
        key: "username",
    },
    CommandSpec {
        command: "narration",
        action: "set_narration",
        key: "narration",
    },
    CommandSpec {
        command: "influencer",
        action: "set_influencer",
        key: "influencer",
    },
    CommandSpec {
        command: "sheet",
        action: "set_character_sheet",
        key: "sheet",
    },
    CommandSpec {
        command: "describe_influencer",
        action: "describe_influencer",
        key: "description",
    },
    CommandSpec {
        command: "captions",
        action: "captions",
        key: "platform",
    },
];

pub(crate) const NUMBER_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "duration",
        action: "set_duration",
        key: "seconds",
    },
    CommandSpec {
        command: "continue",
        action: "continue_story",
        key: "seconds",
    },
];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "image",
        action: "attach_image",
        key: "path",
    },
    CommandSpec {
        command: "background",
        action: "attach_background",
        key: "path",
    },
    CommandSpec {
        command: "logo",
        action: "attach_logo",
        key: "path",
    },
    CommandSpec {
        command: "video",
        action: "attach_video",
        key: "path",
    },
    CommandSpec {
        command: "reference",
        action: "attach_reference",
        key: "path",
    },
];

pub(crate) const MULTI_PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "screenshots",
    action: "attach_screenshots",
    key: "paths",
}];

pub(crate) const REGISTER_COMMAND: CommandSpec = CommandSpec {
    command: "register",
    action: "register",
    key: "fields",
};

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "submit",
        action: "submit",
        key: "",
    },
    CommandSpec {
        command: "plan",
        action: "action_plan",
        key: "",
    },
    CommandSpec {
        command: "character",
        action: "character_sheet",
        key: "",
    },
    CommandSpec {
        command: "idea",
        action: "suggest_idea",
        key: "",
    },
    CommandSpec {
        command: "status",
        action: "status",
        key: "",
    },
    CommandSpec {
        command: "clear",
        action: "clear_media",
        key: "",
    },
    CommandSpec {
        command: "help",
        action: "help",
        key: "",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
        key: "",
    },
];

pub const STUDIO_HELP_COMMANDS: &[&str] = &[
    "/tab",
    "/target",
    "/format",
    "/language",
    "/video_type",
    "/platform",
    "/goal",
    "/username",
    "/narration",
    "/influencer",
    "/sheet",
    "/describe_influencer",
    "/captions",
    "/duration",
    "/continue",
    "/image",
    "/background",
    "/logo",
    "/video",
    "/reference",
    "/screenshots",
    "/register",
    "/submit",
    "/plan",
    "/character",
    "/idea",
    "/status",
    "/clear",
    "/help",
    "/quit",
];
