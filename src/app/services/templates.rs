//! Built-in starter documents.

pub struct Template {
    pub name: &'static str,
    pub title: &'static str,
    pub body: &'static str,
}

const ASSIGNMENT: &str = "\
HOME ASSIGNMENT
Name:
Roll No:
Subject:
Date:

1.
Ans:

2.
Ans:
";

const HOMEWORK: &str = "\
HOMEWORK
Name: Ada Lovelace
Class: Mathematics
Date: 12 March

Q1 What is the difference between a function and a relation?
Answer: Every function is a relation, but a function maps each input to exactly one output.

Q2 State the commutative property of addition.
Answer: Changing the order of the addends does not change the sum, so a + b = b + a.
";

const LETTER: &str = "\
# Dear friend,

I hope this letter finds you well. It has been a long time since we last spoke,
and I wanted to write to you by hand, the old-fashioned way.

With warm regards,
";

pub const TEMPLATES: &[Template] = &[
    Template {
        name: "assignment",
        title: "Blank assignment",
        body: ASSIGNMENT,
    },
    Template {
        name: "homework",
        title: "Sample homework",
        body: HOMEWORK,
    },
    Template {
        name: "letter",
        title: "Personal letter",
        body: LETTER,
    },
];

pub fn find_template(name: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.name == name)
}
