pub mod answer;
pub mod decide;
pub mod search;

pub use answer::AnswerNode;
pub use decide::DecideNode;
pub use search::SearchNode;
