//! Function codes understood by the remote service.

/// A primary remote operation. Each maps to a fixed numeric function id
/// (`fid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Instructor or student.
    CreateUser,
    /// Instructor only.
    CreateCourse,
    /// Student only.
    EnrollStudent,
    /// Instructor only.
    CreateAssignment,
    /// Student or instructor.
    SubmitPaper,
    GenerateReport,
    ShowPaper,
    DeletePaper,
    ChangePassword,
    ListPapers,
    CheckUserPaper,
    ViewAdminStatistics,
    ViewGradeMark,
    ReportTurnaroundTimes,
    SubmissionScores,
    LoginUser,
    LogoutUser,
}

impl Operation {
    pub const ALL: [Operation; 17] = [
        Operation::CreateUser,
        Operation::CreateCourse,
        Operation::EnrollStudent,
        Operation::CreateAssignment,
        Operation::SubmitPaper,
        Operation::GenerateReport,
        Operation::ShowPaper,
        Operation::DeletePaper,
        Operation::ChangePassword,
        Operation::ListPapers,
        Operation::CheckUserPaper,
        Operation::ViewAdminStatistics,
        Operation::ViewGradeMark,
        Operation::ReportTurnaroundTimes,
        Operation::SubmissionScores,
        Operation::LoginUser,
        Operation::LogoutUser,
    ];

    /// The `fid` value sent on the wire.
    pub const fn function_id(self) -> &'static str {
        match self {
            Operation::CreateUser => "1",
            Operation::CreateCourse => "2",
            Operation::EnrollStudent => "3",
            Operation::CreateAssignment => "4",
            Operation::SubmitPaper => "5",
            Operation::GenerateReport => "6",
            Operation::ShowPaper => "7",
            Operation::DeletePaper => "8",
            Operation::ChangePassword => "9",
            Operation::ListPapers => "10",
            Operation::CheckUserPaper => "11",
            Operation::ViewAdminStatistics => "12",
            Operation::ViewGradeMark => "13",
            Operation::ReportTurnaroundTimes => "14",
            Operation::SubmissionScores => "15",
            Operation::LoginUser => "17",
            Operation::LogoutUser => "18",
        }
    }
}

/// Secondary mode layered under an [`Operation`] (`fcmd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCommand {
    /// Build a signed URL for the user's browser; nothing is sent.
    UrlOnly,
    /// Perform the operation and return a response body.
    Standard,
    /// Update an existing object (assignments).
    Update,
}

impl FunctionCommand {
    pub const fn as_str(self) -> &'static str {
        match self {
            FunctionCommand::UrlOnly => "1",
            FunctionCommand::Standard => "2",
            FunctionCommand::Update => "3",
        }
    }
}

/// Role of the acting user (`utp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserType {
    Student,
    Instructor,
}

impl UserType {
    pub const fn as_str(self) -> &'static str {
        match self {
            UserType::Student => "1",
            UserType::Instructor => "2",
        }
    }
}

/// Paper payload kind (`ptype`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperType {
    Text,
    File,
}

impl PaperType {
    pub const fn as_str(self) -> &'static str {
        match self {
            PaperType::Text => "1",
            PaperType::File => "2",
        }
    }
}
