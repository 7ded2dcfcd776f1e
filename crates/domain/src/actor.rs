//! # アクター（承認担当）
//!
//! 承認ステップを担当する役割の識別子。1 人のユーザーが複数のアクターとして
//! 振る舞うことがあるため、ユーザー ID とは別に扱う。

define_uuid_id! {
    /// アクター ID
    pub struct ActorId;
}
