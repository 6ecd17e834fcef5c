entity! {
    /// An account; users are only ever delivered inside other payloads or
    /// lists and have no path of their own.
    User => User {
        id: i64,
        uid: String,
        full_name: String,
        username: String,
        email: String,
        avatar_url: String,
        activated: bool,
    }
}

entity! {
    /// Company-wide card type, e.g. `B` for bug.
    CardType => CardType {
        id: i64,
        letter: String,
        name: String,
        color: i64,
        archived: bool,
    }
}

editable!(CardType);
